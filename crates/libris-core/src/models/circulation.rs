use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::book::Book;
use super::user::UserAccount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowStatus {
    Borrowed,
    Returned,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: i64,
    #[serde(default)]
    pub user: Option<UserAccount>,
    #[serde(default)]
    pub book: Option<Book>,
    #[serde(default)]
    pub borrow_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<BorrowStatus>,
    #[serde(default, alias = "isOverdue")]
    pub overdue: bool,
    #[serde(default)]
    pub days_overdue: i64,
}

impl BorrowRecord {
    pub fn is_returned(&self) -> bool {
        self.return_date.is_some() || self.status == Some(BorrowStatus::Returned)
    }

    pub fn book_title(&self) -> &str {
        self.book.as_ref().map(|b| b.title.as_str()).unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Ready,
    Cancelled,
    Fulfilled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    #[serde(default)]
    pub user: Option<UserAccount>,
    #[serde(default)]
    pub book: Option<Book>,
    #[serde(default)]
    pub reservation_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: Option<ReservationStatus>,
    #[serde(default)]
    pub queue_position: Option<i32>,
    #[serde(default)]
    pub estimated_available_date: Option<NaiveDateTime>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            Some(ReservationStatus::Pending) | Some(ReservationStatus::Ready)
        )
    }
}

/// Body for creating a borrow or a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct CirculationRequest {
    pub user_id: i64,
    pub book_id: i64,
}
