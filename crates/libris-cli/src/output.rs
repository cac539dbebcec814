//! Plain-text rendering of library records.

use libris_core::models::{
    AdminStats, Book, BorrowRecord, Fine, FinePreview, FineStatistics, FineSummary, Reservation,
    UserAccount,
};
use libris_core::SessionIdentity;

const TITLE_WIDTH: usize = 36;

/// Shorten text to a column width, marking the cut with an ellipsis.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn print_identity(identity: &SessionIdentity) {
    println!("{} <{}>", identity.name, identity.email);
    println!("  id:   {}", identity.user_id);
    println!("  role: {}", identity.role);
}

pub fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("No books found.");
        return;
    }
    println!("{:>6}  {:<w$}  {:<24}  {}", "ID", "TITLE", "AUTHOR", "AVAILABLE", w = TITLE_WIDTH);
    for book in books {
        println!(
            "{:>6}  {:<w$}  {:<24}  {}",
            or_dash(book.id),
            truncate(&book.title, TITLE_WIDTH),
            truncate(&book.author, 24),
            if book.is_available() { "yes" } else { "no" },
            w = TITLE_WIDTH
        );
    }
}

pub fn print_book(book: &Book) {
    println!("{} by {}", book.title, book.author);
    println!("  id:        {}", or_dash(book.id));
    println!("  isbn:      {}", or_dash(book.isbn.as_deref()));
    println!("  category:  {}", or_dash(book.category.as_deref()));
    println!("  published: {}", or_dash(book.published_year));
    println!(
        "  copies:    {} of {} available",
        book.copies_available.unwrap_or(0),
        book.copies_total.unwrap_or(0)
    );
}

pub fn print_borrows(records: &[BorrowRecord]) {
    if records.is_empty() {
        println!("No loans.");
        return;
    }
    println!("{:>6}  {:<w$}  {:<10}  {:<10}  {}", "ID", "BOOK", "BORROWED", "DUE", "STATUS", w = TITLE_WIDTH);
    for record in records {
        let status = match record.status {
            Some(status) if record.overdue && !record.is_returned() => {
                format!("{:?} ({} days overdue)", status, record.days_overdue)
            }
            Some(status) => format!("{:?}", status),
            None => "-".to_string(),
        };
        println!(
            "{:>6}  {:<w$}  {:<10}  {:<10}  {}",
            record.id,
            truncate(record.book_title(), TITLE_WIDTH),
            or_dash(record.borrow_date),
            or_dash(record.due_date),
            status,
            w = TITLE_WIDTH
        );
    }
}

pub fn print_reservations(reservations: &[Reservation]) {
    if reservations.is_empty() {
        println!("No reservations.");
        return;
    }
    println!("{:>6}  {:<w$}  {:<10}  {}", "ID", "BOOK", "STATUS", "QUEUE", w = TITLE_WIDTH);
    for reservation in reservations {
        let title = reservation
            .book
            .as_ref()
            .map(|b| b.title.as_str())
            .unwrap_or("Unknown");
        println!(
            "{:>6}  {:<w$}  {:<10}  {}",
            reservation.id,
            truncate(title, TITLE_WIDTH),
            reservation
                .status
                .map(|s| format!("{:?}", s))
                .unwrap_or_else(|| "-".to_string()),
            or_dash(reservation.queue_position),
            w = TITLE_WIDTH
        );
    }
}

pub fn print_fines(fines: &[Fine]) {
    if fines.is_empty() {
        println!("No fines.");
        return;
    }
    println!("{:>6}  {:>9}  {:>5}  {}", "ID", "AMOUNT", "DAYS", "STATUS");
    for fine in fines {
        println!(
            "{:>6}  {:>9.2}  {:>5}  {}",
            fine.id,
            fine.amount,
            fine.days_overdue,
            fine.status
                .map(|s| format!("{:?}", s))
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

pub fn print_fine_summary(summary: &FineSummary) {
    println!(
        "{} unpaid fine(s), {:.2} outstanding",
        summary.unpaid_count, summary.total_unpaid_amount
    );
}

pub fn print_fine_preview(preview: &FinePreview) {
    if !preview.overdue {
        println!("Not overdue, no fine.");
        return;
    }
    println!(
        "{} day(s) overdue at {:.2}/day: {:.2}{}",
        preview.days_overdue,
        preview.daily_rate,
        preview.amount,
        if preview.capped { " (capped)" } else { "" }
    );
}

pub fn print_fine_statistics(stats: &FineStatistics) {
    println!("Unpaid:    {} fine(s), {:.2}", stats.total_unpaid_count, stats.total_unpaid_amount);
    println!("Collected: {} fine(s), {:.2}", stats.total_paid_count, stats.total_collected_amount);
    println!(
        "Policy:    {:.2}/day, max {:.2}, {} day(s) grace",
        stats.daily_rate, stats.max_amount, stats.grace_period_days
    );
}

pub fn print_users(users: &[UserAccount]) {
    println!("{:>6}  {:<24}  {:<32}  {}", "ID", "NAME", "EMAIL", "ROLE");
    for user in users {
        println!(
            "{:>6}  {:<24}  {:<32}  {}",
            user.id,
            truncate(&user.name, 24),
            truncate(&user.email, 32),
            or_dash(user.role)
        );
    }
}

pub fn print_admin_stats(stats: &AdminStats) {
    println!("Users:            {}", stats.total_users);
    println!("Books:            {}", stats.total_books);
    println!("Loans:            {}", stats.total_borrows);
    println!("Reservations:     {}", stats.total_reservations);
    println!("Overdue loans:    {}", stats.overdue_borrows);
    println!("Active fines:     {}", stats.active_fines);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dune", 10), "Dune");
        assert_eq!(truncate("The Left Hand of Darkness", 10), "The Left …");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some(3)), "3");
        assert_eq!(or_dash::<i32>(None), "-");
    }
}
