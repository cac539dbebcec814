use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::circulation::BorrowRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FineStatus {
    Unpaid,
    Paid,
    Waived,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct Fine {
    pub id: i64,
    #[serde(default)]
    pub borrow_record: Option<BorrowRecord>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub days_overdue: i32,
    #[serde(default)]
    pub daily_rate: Option<f64>,
    #[serde(default)]
    pub status: Option<FineStatus>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub paid_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
}

impl Fine {
    pub fn is_unpaid(&self) -> bool {
        self.status == Some(FineStatus::Unpaid)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct FineSummary {
    #[serde(default)]
    pub total_unpaid_amount: f64,
    #[serde(default)]
    pub unpaid_count: i64,
    #[serde(default)]
    pub all_fines: Vec<Fine>,
}

/// Fine the backend would charge for a given due and return date.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct FinePreview {
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub days_overdue: i32,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub daily_rate: f64,
    #[serde(default)]
    pub grace_period_days: i32,
    #[serde(default, alias = "isOverdue")]
    pub overdue: bool,
    #[serde(default, alias = "isCapped")]
    pub capped: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct FineStatistics {
    #[serde(default)]
    pub total_unpaid_amount: f64,
    #[serde(default)]
    pub total_collected_amount: f64,
    #[serde(default)]
    pub total_unpaid_count: i64,
    #[serde(default)]
    pub total_paid_count: i64,
    #[serde(default)]
    pub daily_rate: f64,
    #[serde(default)]
    pub max_amount: f64,
    #[serde(default)]
    pub grace_period_days: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fine_summary() {
        let json = r#"{
            "totalUnpaidAmount": 4.5,
            "unpaidCount": 1,
            "allFines": [
                {"id": 3, "amount": 4.5, "daysOverdue": 9, "dailyRate": 0.5, "status": "UNPAID",
                 "createdAt": "2024-05-02T08:00:00", "dueDate": "2024-04-20", "returnDate": "2024-04-29"}
            ]
        }"#;
        let summary: FineSummary = serde_json::from_str(json).expect("Failed to parse summary JSON");

        assert_eq!(summary.unpaid_count, 1);
        assert_eq!(summary.all_fines.len(), 1);
        assert!(summary.all_fines[0].is_unpaid());
        assert_eq!(summary.all_fines[0].days_overdue, 9);
    }

    #[test]
    fn test_parse_preview_with_bean_style_flags() {
        let json = r#"{"dueDate":"2024-04-20","returnDate":"2024-05-20","daysOverdue":27,"amount":10.0,"dailyRate":0.5,"gracePeriodDays":3,"overdue":true,"isCapped":true}"#;
        let preview: FinePreview = serde_json::from_str(json).expect("Failed to parse preview JSON");

        assert!(preview.overdue);
        assert!(preview.capped);
        assert_eq!(preview.grace_period_days, 3);
    }
}
