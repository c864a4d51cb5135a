use std::time::Duration;

use lendlog::{
    book::BookDraft,
    core::store::{LibraryStore, Outcome},
    runtime::{
        events::LendingEvent,
        handle::{spawn_lendlog, RuntimeConfig},
    },
    user::UserDraft,
};

fn book(id: &str, title: &str, copies: u32) -> BookDraft {
    BookDraft {
        id: id.to_string(),
        title: title.to_string(),
        author: "Author".to_string(),
        year: 1999,
        copies_total: copies,
    }
}

fn user(id: &str, name: &str) -> UserDraft {
    UserDraft {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

async fn next_event(sub: &mut tokio::sync::broadcast::Receiver<LendingEvent>) -> LendingEvent {
    tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("event timeout")
        .expect("recv")
}

#[tokio::test]
async fn runtime_register_borrow_query_and_events_ordered() {
    let handle = spawn_lendlog(LibraryStore::new(), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    handle
        .register_book(book("B1", "Dune", 1))
        .await
        .expect("register book");
    handle
        .register_user(user("U1", "Ana"))
        .await
        .expect("register user");
    let outcome = handle.borrow("U1", "B1").await.expect("borrow");
    assert!(matches!(outcome, Outcome::Loaned { .. }));

    assert_eq!(
        next_event(&mut sub).await,
        LendingEvent::BookRegistered {
            book_id: "B1".to_string()
        }
    );
    assert_eq!(
        next_event(&mut sub).await,
        LendingEvent::UserRegistered {
            user_id: "U1".to_string()
        }
    );
    assert_eq!(
        next_event(&mut sub).await,
        LendingEvent::Loaned {
            user_id: "U1".to_string(),
            book_id: "B1".to_string()
        }
    );

    let books = handle.books().await.expect("list books");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].copies_available, 0);

    let holder = handle.user("U1").await.expect("get user").expect("user");
    assert_eq!(holder.borrowed, vec!["B1".to_string()]);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn runtime_queue_promotion_and_undo_events() {
    let handle = spawn_lendlog(LibraryStore::new(), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    handle
        .register_book(book("B1", "Dune", 1))
        .await
        .expect("register book");
    handle
        .register_user(user("U1", "Ana"))
        .await
        .expect("register user");
    handle
        .register_user(user("U2", "Luis"))
        .await
        .expect("register user");

    handle.borrow("U1", "B1").await.expect("borrow");
    let queued = handle.borrow("U2", "B1").await.expect("queue");
    assert!(matches!(queued, Outcome::Queued { position: 1, .. }));

    // Idempotent re-queue emits no event and changes nothing.
    let again = handle.borrow("U2", "B1").await.expect("re-queue");
    assert!(matches!(again, Outcome::AlreadyQueued { .. }));

    let returned = handle.return_book("U1", "B1").await.expect("return");
    match returned {
        Outcome::Returned { promotion, .. } => {
            assert_eq!(promotion.map(|p| p.user_id), Some("U2".to_string()));
        }
        other => panic!("expected Returned, got {other:?}"),
    }

    let undone = handle.undo().await.expect("undo");
    assert!(matches!(undone, Outcome::UndidReturn { .. }));

    let mut seen = Vec::new();
    for _ in 0..8 {
        seen.push(next_event(&mut sub).await);
        if matches!(seen.last(), Some(LendingEvent::UndoApplied)) {
            break;
        }
    }
    assert_eq!(
        seen,
        vec![
            LendingEvent::BookRegistered {
                book_id: "B1".to_string()
            },
            LendingEvent::UserRegistered {
                user_id: "U1".to_string()
            },
            LendingEvent::UserRegistered {
                user_id: "U2".to_string()
            },
            LendingEvent::Loaned {
                user_id: "U1".to_string(),
                book_id: "B1".to_string()
            },
            LendingEvent::Queued {
                user_id: "U2".to_string(),
                book_id: "B1".to_string(),
                position: 1
            },
            LendingEvent::Returned {
                user_id: "U1".to_string(),
                book_id: "B1".to_string(),
                promoted: Some("U2".to_string())
            },
            LendingEvent::UndoApplied,
        ]
    );

    // After the undo, U1 holds the copy and U2 leads the queue again.
    let book = handle.book("B1").await.expect("get book").expect("book");
    assert_eq!(book.copies_available, 0);
    assert_eq!(
        book.reservations.iter().collect::<Vec<_>>(),
        vec!["U2"]
    );

    handle.shutdown().await.expect("shutdown");
}
