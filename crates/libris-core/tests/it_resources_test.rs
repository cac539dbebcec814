//! Integration tests for the typed resource endpoints.

use chrono::NaiveDate;
use libris_core::models::{BookFilters, FineStatus};
use libris_core::{ApiClient, ApiError, CredentialStore};
use mockito::{Matcher, Server};
use serde_json::json;

fn client(server: &Server) -> ApiClient {
    let credentials = CredentialStore::in_memory();
    credentials.set_tokens("T1", Some("R1")).unwrap();
    ApiClient::builder()
        .base_url(server.url())
        .credentials(credentials)
        .build()
        .expect("Failed to build client")
}

#[tokio::test]
async fn search_sends_query_and_filters() {
    //* Given
    let mut server = Server::new_async().await;
    let search_mock = server
        .mock("GET", "/books/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".into(), "dune".into()),
            Matcher::UrlEncoded("category".into(), "Science Fiction".into()),
        ]))
        .with_status(200)
        .with_body(r#"[{"id":1,"title":"Dune","author":"Frank Herbert","copiesAvailable":2}]"#)
        .expect(1)
        .create_async()
        .await;
    let client = client(&server);

    //* When
    let filters = BookFilters {
        category: Some("Science Fiction".to_string()),
        ..Default::default()
    };
    let books = client
        .search_books("dune", &filters)
        .await
        .expect("Failed to search");

    //* Then
    search_mock.assert_async().await;
    assert_eq!(books.len(), 1);
    assert!(books[0].is_available());
}

#[tokio::test]
async fn borrow_posts_user_and_book() {
    //* Given
    let mut server = Server::new_async().await;
    let borrow_mock = server
        .mock("POST", "/borrow")
        .match_body(Matcher::Json(json!({"userId": 7, "bookId": 1})))
        .with_status(200)
        .with_body(r#"{"id":5,"borrowDate":"2024-04-01","dueDate":"2024-04-15","status":"BORROWED"}"#)
        .expect(1)
        .create_async()
        .await;
    let client = client(&server);

    //* When
    let record = client.borrow_book(7, 1).await.expect("Failed to borrow");

    //* Then
    borrow_mock.assert_async().await;
    assert_eq!(record.id, 5);
    assert_eq!(record.due_date, NaiveDate::from_ymd_opt(2024, 4, 15));
}

#[tokio::test]
async fn conflict_surfaces_server_message() {
    //* Given
    let mut server = Server::new_async().await;
    let reserve_mock = server
        .mock("POST", "/reservations")
        .with_status(409)
        .with_body(r#"{"message":"You already reserved this book"}"#)
        .expect(1)
        .create_async()
        .await;
    let client = client(&server);

    //* When
    let result = client.create_reservation(7, 1).await;

    //* Then
    reserve_mock.assert_async().await;
    let err = result.expect_err("409 must surface");
    assert!(matches!(err, ApiError::Conflict(ref m) if m == "You already reserved this book"));
    assert_eq!(err.notifications(), vec!["You already reserved this book".to_string()]);
}

#[tokio::test]
async fn cancel_reservation_accepts_empty_body() {
    //* Given
    let mut server = Server::new_async().await;
    let cancel_mock = server
        .mock("PUT", "/reservations/9/cancel")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let client = client(&server);

    //* When
    let result = client.cancel_reservation(9).await;

    //* Then
    cancel_mock.assert_async().await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn fine_preview_sends_dates() {
    //* Given
    let mut server = Server::new_async().await;
    let preview_mock = server
        .mock("GET", "/fines/preview")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("dueDate".into(), "2024-04-20".into()),
            Matcher::UrlEncoded("returnDate".into(), "2024-05-01".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"daysOverdue":11,"amount":5.5,"dailyRate":0.5,"gracePeriodDays":0,"overdue":true}"#)
        .expect(1)
        .create_async()
        .await;
    let client = client(&server);

    //* When
    let preview = client
        .preview_fine(
            NaiveDate::from_ymd_opt(2024, 4, 20).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        )
        .await
        .expect("Failed to preview");

    //* Then
    preview_mock.assert_async().await;
    assert_eq!(preview.days_overdue, 11);
    assert!(preview.overdue);
}

#[tokio::test]
async fn pay_fine_returns_paid_fine() {
    //* Given
    let mut server = Server::new_async().await;
    let pay_mock = server
        .mock("POST", "/fines/3/pay")
        .match_header("authorization", "Bearer T1")
        .with_status(200)
        .with_body(r#"{"id":3,"amount":4.5,"status":"PAID","paidAt":"2024-05-03T10:00:00"}"#)
        .expect(1)
        .create_async()
        .await;
    let client = client(&server);

    //* When
    let fine = client.pay_fine(3).await.expect("Failed to pay fine");

    //* Then
    pay_mock.assert_async().await;
    assert_eq!(fine.status, Some(FineStatus::Paid));
    assert!(fine.paid_at.is_some());
}

#[tokio::test]
async fn server_error_uses_generic_notification() {
    //* Given
    let mut server = Server::new_async().await;
    let stats_mock = server
        .mock("GET", "/admin/stats")
        .with_status(500)
        .with_body("java.lang.NullPointerException")
        .expect(1)
        .create_async()
        .await;
    let client = client(&server);

    //* When
    let result = client.fetch_admin_stats().await;

    //* Then
    stats_mock.assert_async().await;
    let err = result.expect_err("500 must surface");
    assert_eq!(err.status(), 500);
    assert_eq!(
        err.notifications(),
        vec!["Server error. Please try again later.".to_string()]
    );
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    //* Given
    let mut server = Server::new_async().await;
    let books_mock = server
        .mock("GET", "/books/1")
        .with_status(200)
        .with_body("<html>")
        .expect(1)
        .create_async()
        .await;
    let client = client(&server);

    //* When
    let result = client.fetch_book(1).await;

    //* Then
    books_mock.assert_async().await;
    assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
}
