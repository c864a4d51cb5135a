//! Reversible operation records for the undo slot.

use crate::types::{BookId, UserId};

/// State needed to reverse the most recent lending operation.
///
/// Only loans and returns are reversible; reservation enqueues are not
/// recorded and cannot be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// A copy was lent directly to a user.
    Borrow {
        /// Borrowing user.
        user_id: UserId,
        /// Book lent.
        book_id: BookId,
    },
    /// A copy was returned, possibly re-lent to the head of the queue.
    Return {
        /// Returning user.
        user_id: UserId,
        /// Book returned.
        book_id: BookId,
        /// User the copy was auto-lent to from the reservation queue, if any.
        promoted: Option<UserId>,
    },
}
