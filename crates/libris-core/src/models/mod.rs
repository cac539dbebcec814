//! Data models for library entities.
//!
//! - `Book`, `BookFilters`: catalogue entries and search filters
//! - `BorrowRecord`, `Reservation`: circulation records
//! - `Fine`, `FineSummary`, `FinePreview`, `FineStatistics`: overdue fines
//! - `UserProfile`, `UserAccount`, `AdminStats`: accounts and dashboard counters

pub mod book;
pub mod circulation;
pub mod fine;
pub mod user;

pub use book::{Book, BookFilters};
pub use circulation::{BorrowRecord, BorrowStatus, CirculationRequest, Reservation, ReservationStatus};
pub use fine::{Fine, FinePreview, FineStatistics, FineStatus, FineSummary};
pub use user::{AdminStats, PasswordChange, RegisterRequest, UserAccount, UserProfile, UserUpdate};
