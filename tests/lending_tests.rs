//! Lending engine integration tests over the in-process backend

use std::sync::Arc;

use chrono::NaiveDate;

use jigyasa_server::config::{CacheConfig, ConfirmConfig};
use jigyasa_server::error::AppError;
use jigyasa_server::models::{Book, Member};
use jigyasa_server::services::Services;
use jigyasa_server::storage::{memory::MemoryStorage, Storage};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn library() -> (Arc<MemoryStorage>, Services) {
    let storage = Arc::new(MemoryStorage::new());
    storage.seed_book(Book {
        id: 1,
        title: "The C Programming Language".to_string(),
        available_copies: 1,
    });
    storage.seed_book(Book {
        id: 2,
        title: "The Rust Programming Language".to_string(),
        available_copies: 3,
    });
    storage.seed_member(Member {
        id: 1,
        name: "Asha".to_string(),
    });
    storage.seed_member(Member {
        id: 2,
        name: "Ravi".to_string(),
    });

    let services = Services::new(
        storage.clone(),
        &CacheConfig { ttl_seconds: 60 },
        &ConfirmConfig {
            token_ttl_seconds: 120,
        },
    );
    (storage, services)
}

#[tokio::test]
async fn lend_and_return_lifecycle() {
    let (storage, services) = library();

    // First lend on an empty ledger assigns id 1
    let tx = services.lending.lend(1, 1, date(2024, 1, 1)).await.unwrap();
    assert_eq!(tx.id, 1);
    assert_eq!(tx.book_id, 1);
    assert_eq!(tx.member_id, 1);
    assert_eq!(tx.borrow_date, date(2024, 1, 1));
    assert_eq!(tx.due_date, date(2024, 1, 15));
    assert_eq!(tx.return_date, None);
    assert_eq!(storage.get_book(1).await.unwrap().available_copies, 0);

    // Last copy is out; the next lend is rejected and changes nothing
    let err = services
        .lending
        .lend(1, 2, date(2024, 1, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NoCopiesAvailable { book_id: 1 }));
    assert_eq!(storage.list_transactions().await.unwrap().len(), 1);
    assert_eq!(storage.get_book(1).await.unwrap().available_copies, 0);

    // Return puts the copy back and stamps the return date
    let returned = services
        .lending
        .return_book(1, date(2024, 1, 10))
        .await
        .unwrap();
    assert_eq!(returned.return_date, Some(date(2024, 1, 10)));
    assert_eq!(storage.get_book(1).await.unwrap().available_copies, 1);

    // A second return is rejected and must not increment again
    let err = services
        .lending
        .return_book(1, date(2024, 1, 11))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyReturned { transaction_id: 1 }));
    assert_eq!(storage.get_book(1).await.unwrap().available_copies, 1);
    assert_eq!(
        storage.get_transaction(1).await.unwrap().return_date,
        Some(date(2024, 1, 10))
    );
}

#[tokio::test]
async fn lend_failure_leaves_state_unchanged() {
    let (storage, services) = library();
    services.lending.lend(1, 1, date(2024, 1, 1)).await.unwrap();

    let books_before = storage.list_books().await.unwrap();
    let ledger_before = storage.list_transactions().await.unwrap();

    let err = services
        .lending
        .lend(1, 2, date(2024, 1, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NoCopiesAvailable { .. }));

    assert_eq!(storage.list_books().await.unwrap(), books_before);
    assert_eq!(storage.list_transactions().await.unwrap(), ledger_before);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let (storage, services) = library();

    assert!(matches!(
        services
            .lending
            .lend(99, 1, date(2024, 1, 1))
            .await
            .unwrap_err(),
        AppError::NotFound { .. }
    ));
    assert!(matches!(
        services
            .lending
            .lend(1, 99, date(2024, 1, 1))
            .await
            .unwrap_err(),
        AppError::NotFound { .. }
    ));
    assert!(matches!(
        services
            .lending
            .return_book(999, date(2024, 1, 1))
            .await
            .unwrap_err(),
        AppError::NotFound { .. }
    ));

    // None of the failures wrote anything
    assert!(storage.list_transactions().await.unwrap().is_empty());
}

#[tokio::test]
async fn due_date_is_always_fourteen_days_out() {
    let (_storage, services) = library();

    let tx = services
        .lending
        .lend(2, 1, date(2024, 2, 28))
        .await
        .unwrap();
    assert_eq!(tx.due_date, date(2024, 3, 13));

    let tx = services
        .lending
        .lend(2, 2, date(2024, 12, 31))
        .await
        .unwrap();
    assert_eq!(tx.due_date, date(2025, 1, 14));
}

#[tokio::test]
async fn ids_grow_and_are_never_reused() {
    let (_storage, services) = library();

    let a = services.lending.lend(2, 1, date(2024, 1, 1)).await.unwrap();
    let b = services.lending.lend(2, 2, date(2024, 1, 2)).await.unwrap();
    assert!(b.id > a.id);

    // Returning does not free an id for reuse
    services
        .lending
        .return_book(b.id, date(2024, 1, 5))
        .await
        .unwrap();
    let c = services.lending.lend(2, 1, date(2024, 1, 6)).await.unwrap();
    assert!(c.id > b.id);
}

#[tokio::test]
async fn copies_never_go_negative() {
    let (storage, services) = library();

    for day in 1..=5 {
        let _ = services.lending.lend(1, 1, date(2024, 1, day)).await;
        let _ = services.lending.lend(2, 2, date(2024, 1, day)).await;
        let copies = storage.get_book(1).await.unwrap().available_copies;
        assert!(copies >= 0);
        let copies = storage.get_book(2).await.unwrap().available_copies;
        assert!(copies >= 0);
    }
}

#[tokio::test]
async fn recent_transactions_are_enriched_and_ordered() {
    let (_storage, services) = library();

    services.lending.lend(1, 1, date(2024, 1, 1)).await.unwrap();
    services.lending.lend(2, 2, date(2024, 1, 3)).await.unwrap();
    services.lending.lend(2, 1, date(2024, 1, 3)).await.unwrap();

    let recent = services
        .queries
        .recent_transactions(10, date(2024, 1, 20))
        .await
        .unwrap();

    assert_eq!(recent.len(), 3);
    // Newest borrow date first, newest ledger entry first among ties
    assert_eq!(recent[0].id, 3);
    assert_eq!(recent[1].id, 2);
    assert_eq!(recent[2].id, 1);

    assert_eq!(recent[2].book_title, "The C Programming Language");
    assert_eq!(recent[2].member_name, "Asha");
    assert!(recent[2].is_overdue);

    let limited = services
        .queries
        .recent_transactions(2, date(2024, 1, 20))
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn outstanding_loans_are_open_transactions_only() {
    let (_storage, services) = library();

    let a = services.lending.lend(1, 1, date(2024, 1, 1)).await.unwrap();
    let b = services.lending.lend(2, 2, date(2024, 1, 2)).await.unwrap();
    services
        .lending
        .return_book(a.id, date(2024, 1, 5))
        .await
        .unwrap();

    let outstanding = services.queries.outstanding_loans().await.unwrap();
    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding[0].id, b.id);
}

#[tokio::test]
async fn stats_count_active_and_overdue() {
    let (_storage, services) = library();

    services.lending.lend(1, 1, date(2024, 1, 1)).await.unwrap();
    services.lending.lend(2, 2, date(2024, 2, 1)).await.unwrap();

    let stats = services.queries.stats(date(2024, 2, 5)).await.unwrap();
    assert_eq!(stats.books, 2);
    assert_eq!(stats.members, 2);
    assert_eq!(stats.active_loans, 2);
    // Only the January loan is past due on Feb 5
    assert_eq!(stats.overdue_loans, 1);
}

#[tokio::test]
async fn search_is_prefix_based_and_availability_aware() {
    let (_storage, services) = library();

    let books = services.catalog.search_books("the c").await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, 1);

    // Lend out the only copy; the book drops out of search results
    services.lending.lend(1, 1, date(2024, 1, 1)).await.unwrap();
    let books = services.catalog.search_books("the c").await.unwrap();
    assert!(books.is_empty());

    let members = services.catalog.search_members("ra").await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "Ravi");
}
