use lendlog::{
    book::BookDraft,
    core::store::{LibraryStore, Outcome, StoreError},
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

fn holds(store: &LibraryStore, user_id: &str, book_id: &str) -> bool {
    store
        .user(user_id)
        .is_some_and(|u| u.borrowed.iter().any(|b| b == book_id))
}

fn available(store: &LibraryStore, book_id: &str) -> u32 {
    store.book(book_id).map(|b| b.copies_available).unwrap_or(0)
}

#[test]
fn undo_reverses_a_loan() {
    let mut store = LibraryStore::new();
    store.add_book(book("B1", "Dune", 1)).unwrap();
    store.add_user(user("U1", "Ana")).unwrap();

    store.borrow("U1", "B1").unwrap();
    assert_eq!(available(&store, "B1"), 0);
    assert!(holds(&store, "U1", "B1"));

    let outcome = store.undo_last().unwrap();
    assert!(matches!(outcome, Outcome::UndidLoan { .. }));
    assert_eq!(available(&store, "B1"), 1);
    assert!(!holds(&store, "U1", "B1"));
}

#[test]
fn undo_depth_is_exactly_one() {
    let mut store = LibraryStore::new();
    store.add_book(book("B1", "Dune", 1)).unwrap();
    store.add_user(user("U1", "Ana")).unwrap();

    store.borrow("U1", "B1").unwrap();
    assert!(store.has_undo());

    assert!(matches!(
        store.undo_last().unwrap(),
        Outcome::UndidLoan { .. }
    ));
    assert!(!store.has_undo());
    assert_eq!(store.undo_last().unwrap(), Outcome::NothingToUndo);
}

#[test]
fn undo_reverses_a_plain_return() {
    let mut store = LibraryStore::new();
    store.add_book(book("B1", "Dune", 1)).unwrap();
    store.add_user(user("U1", "Ana")).unwrap();

    store.borrow("U1", "B1").unwrap();
    store.return_book("U1", "B1").unwrap();
    assert_eq!(available(&store, "B1"), 1);

    let outcome = store.undo_last().unwrap();
    assert!(matches!(outcome, Outcome::UndidReturn { .. }));
    assert_eq!(available(&store, "B1"), 0);
    assert!(holds(&store, "U1", "B1"));
}

#[test]
fn undo_of_promoted_return_restores_queue_front() {
    let mut store = LibraryStore::new();
    store.add_book(book("B1", "Dune", 1)).unwrap();
    store.add_user(user("U1", "Ana")).unwrap();
    store.add_user(user("U2", "Luis")).unwrap();

    store.borrow("U1", "B1").unwrap();
    store.borrow("U2", "B1").unwrap();
    let returned = store.return_book("U1", "B1").unwrap();
    match returned {
        Outcome::Returned { promotion, .. } => {
            assert_eq!(promotion.map(|p| p.user_id), Some("U2".to_string()));
        }
        other => panic!("expected Returned, got {other:?}"),
    }
    assert!(holds(&store, "U2", "B1"));

    let outcome = store.undo_last().unwrap();
    assert!(matches!(outcome, Outcome::UndidReturn { .. }));

    // U1 holds the copy again; U2 is back at the front of the queue.
    assert!(holds(&store, "U1", "B1"));
    assert!(!holds(&store, "U2", "B1"));
    assert_eq!(available(&store, "B1"), 0);
    let queue: Vec<_> = store.book("B1").unwrap().reservations.iter().collect();
    assert_eq!(queue, vec!["U2"]);
}

#[test]
fn reservation_enqueue_is_not_undoable() {
    let mut store = LibraryStore::new();
    store.add_book(book("B1", "Dune", 1)).unwrap();
    store.add_user(user("U1", "Ana")).unwrap();
    store.add_user(user("U2", "Luis")).unwrap();

    store.borrow("U1", "B1").unwrap();
    assert!(matches!(
        store.borrow("U2", "B1").unwrap(),
        Outcome::Queued { position: 1, .. }
    ));

    // The undo slot still holds U1's loan, not the enqueue.
    let outcome = store.undo_last().unwrap();
    match outcome {
        Outcome::UndidLoan { user_id, .. } => assert_eq!(user_id, "U1"),
        other => panic!("expected UndidLoan, got {other:?}"),
    }
    let queue: Vec<_> = store.book("B1").unwrap().reservations.iter().collect();
    assert_eq!(queue, vec!["U2"]);
}

#[test]
fn failed_operations_leave_the_undo_slot_untouched() {
    let mut store = LibraryStore::new();
    store.add_book(book("B1", "Dune", 1)).unwrap();
    store.add_user(user("U1", "Ana")).unwrap();
    store.add_user(user("U2", "Luis")).unwrap();

    store.borrow("U1", "B1").unwrap();
    assert_eq!(
        store.return_book("U2", "B1"),
        Err(StoreError::NotBorrowed {
            user_id: "U2".to_string(),
            book_id: "B1".to_string(),
        })
    );

    // The failed return did not clobber the recorded loan.
    let outcome = store.undo_last().unwrap();
    assert!(matches!(outcome, Outcome::UndidLoan { .. }));
    assert_eq!(available(&store, "B1"), 1);
}
