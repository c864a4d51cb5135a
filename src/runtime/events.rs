//! Runtime event stream payloads.

use crate::types::{BookId, UserId};

/// Events emitted from the single-writer runtime loop.
///
/// Only state changes are broadcast; informational no-ops (an already-queued
/// borrow, an empty undo slot) emit nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LendingEvent {
    /// A book was added to the catalog.
    BookRegistered {
        /// New book id.
        book_id: BookId,
    },
    /// A user was added to the membership.
    UserRegistered {
        /// New user id.
        user_id: UserId,
    },
    /// A copy was lent directly.
    Loaned {
        /// Borrowing user.
        user_id: UserId,
        /// Book lent.
        book_id: BookId,
    },
    /// A user joined a reservation queue.
    Queued {
        /// Waiting user.
        user_id: UserId,
        /// Book waited on.
        book_id: BookId,
        /// 1-indexed queue position.
        position: usize,
    },
    /// A copy was returned, possibly re-lent to the head of the queue.
    Returned {
        /// Returning user.
        user_id: UserId,
        /// Book returned.
        book_id: BookId,
        /// User auto-lent to, if any.
        promoted: Option<UserId>,
    },
    /// One undo step was applied.
    UndoApplied,
}
