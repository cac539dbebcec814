//! Fine endpoints (`/fines`).
//!
//! Amounts are computed server-side; these calls only read and settle them.

use chrono::NaiveDate;

use crate::models::{Fine, FinePreview, FineStatistics, FineSummary};

use super::{ApiClient, ApiError, ApiRequest};

impl ApiClient {
    pub async fn fetch_my_fines(&self) -> Result<Vec<Fine>, ApiError> {
        self.get("/fines/my-fines").await
    }

    pub async fn fetch_my_unpaid_fines(&self) -> Result<Vec<Fine>, ApiError> {
        self.get("/fines/my-fines/unpaid").await
    }

    pub async fn fetch_my_fine_summary(&self) -> Result<FineSummary, ApiError> {
        self.get("/fines/my-fines/summary").await
    }

    pub async fn pay_fine(&self, fine_id: i64) -> Result<Fine, ApiError> {
        self.send(ApiRequest::post(format!("/fines/{}/pay", fine_id))).await
    }

    pub async fn pay_all_fines(&self) -> Result<Vec<Fine>, ApiError> {
        self.send(ApiRequest::post("/fines/pay-all")).await
    }

    pub async fn preview_fine(
        &self,
        due_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Result<FinePreview, ApiError> {
        let request = ApiRequest::get("/fines/preview")
            .query("dueDate", due_date)
            .query("returnDate", return_date);
        self.send(request).await
    }

    pub async fn fetch_fine(&self, fine_id: i64) -> Result<Fine, ApiError> {
        self.get(&format!("/fines/{}", fine_id)).await
    }

    // ===== Admin =====

    pub async fn fetch_all_fines(&self) -> Result<Vec<Fine>, ApiError> {
        self.get("/fines").await
    }

    pub async fn fetch_all_unpaid_fines(&self) -> Result<Vec<Fine>, ApiError> {
        self.get("/fines/unpaid").await
    }

    pub async fn fetch_user_fines(&self, user_id: i64) -> Result<Vec<Fine>, ApiError> {
        self.get(&format!("/fines/user/{}", user_id)).await
    }

    pub async fn fetch_fine_statistics(&self) -> Result<FineStatistics, ApiError> {
        self.get("/fines/statistics").await
    }

    pub async fn waive_fine(&self, fine_id: i64) -> Result<Fine, ApiError> {
        self.send(ApiRequest::post(format!("/fines/{}/waive", fine_id))).await
    }
}
