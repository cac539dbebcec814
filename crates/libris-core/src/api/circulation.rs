//! Borrowing (`/borrow`) and reservation (`/reservations`) endpoints.

use serde_json::Value;

use crate::models::{BorrowRecord, CirculationRequest, Reservation};

use super::{ApiClient, ApiError, ApiRequest};

impl ApiClient {
    // ===== Borrowing =====

    pub async fn borrow_book(&self, user_id: i64, book_id: i64) -> Result<BorrowRecord, ApiError> {
        self.post("/borrow", &CirculationRequest { user_id, book_id }).await
    }

    pub async fn return_book(&self, borrow_id: i64) -> Result<BorrowRecord, ApiError> {
        self.send(ApiRequest::post(format!("/borrow/{}/return", borrow_id))).await
    }

    pub async fn extend_borrow(&self, borrow_id: i64) -> Result<BorrowRecord, ApiError> {
        self.send(ApiRequest::put(format!("/borrow/{}/extend", borrow_id))).await
    }

    pub async fn fetch_my_borrows(&self) -> Result<Vec<BorrowRecord>, ApiError> {
        self.get("/borrow/my-books").await
    }

    pub async fn fetch_user_borrows(&self, user_id: i64) -> Result<Vec<BorrowRecord>, ApiError> {
        self.get(&format!("/borrow/user/{}", user_id)).await
    }

    pub async fn fetch_overdue_borrows(&self) -> Result<Vec<BorrowRecord>, ApiError> {
        self.get("/borrow/overdue").await
    }

    pub async fn fetch_all_borrows(&self) -> Result<Vec<BorrowRecord>, ApiError> {
        self.get("/borrow").await
    }

    pub async fn fetch_book_borrow_history(&self, book_id: i64) -> Result<Vec<BorrowRecord>, ApiError> {
        self.get(&format!("/borrow/book/{}/history", book_id)).await
    }

    // ===== Reservations =====

    pub async fn create_reservation(&self, user_id: i64, book_id: i64) -> Result<Reservation, ApiError> {
        self.post("/reservations", &CirculationRequest { user_id, book_id }).await
    }

    pub async fn fetch_my_reservations(&self) -> Result<Vec<Reservation>, ApiError> {
        self.get("/reservations/my-reservations").await
    }

    pub async fn fetch_user_reservations(&self, user_id: i64) -> Result<Vec<Reservation>, ApiError> {
        self.get(&format!("/reservations/user/{}", user_id)).await
    }

    pub async fn fetch_all_reservations(&self) -> Result<Vec<Reservation>, ApiError> {
        self.get("/reservations").await
    }

    pub async fn fetch_book_reservations(&self, book_id: i64) -> Result<Vec<Reservation>, ApiError> {
        self.get(&format!("/reservations/book/{}", book_id)).await
    }

    /// Cancel a reservation. The backend answers with an empty body.
    pub async fn cancel_reservation(&self, reservation_id: i64) -> Result<(), ApiError> {
        self.send_empty(ApiRequest::put(format!("/reservations/{}/cancel", reservation_id)))
            .await
    }

    pub async fn mark_reservation_ready(&self, reservation_id: i64) -> Result<Reservation, ApiError> {
        self.send(ApiRequest::put(format!("/reservations/{}/ready", reservation_id)))
            .await
    }

    pub async fn fulfill_reservation(&self, reservation_id: i64) -> Result<BorrowRecord, ApiError> {
        self.send(ApiRequest::post(format!("/reservations/{}/fulfill", reservation_id)))
            .await
    }

    /// Position of a reservation in its book's queue, if the backend reports one.
    pub async fn fetch_queue_position(&self, reservation_id: i64) -> Result<Option<i64>, ApiError> {
        let value: Value = self
            .get(&format!("/reservations/{}/position", reservation_id))
            .await?;
        Ok(queue_position_from(&value))
    }
}

/// The position comes back either as a bare number or inside an object.
fn queue_position_from(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::Object(map) => ["position", "queuePosition"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_i64)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_queue_position_shapes() {
        assert_eq!(queue_position_from(&json!(3)), Some(3));
        assert_eq!(queue_position_from(&json!({"position": 2})), Some(2));
        assert_eq!(queue_position_from(&json!({"queuePosition": 4, "id": 9})), Some(4));
        assert_eq!(queue_position_from(&json!(null)), None);
        assert_eq!(queue_position_from(&json!({"id": 9})), None);
    }
}
