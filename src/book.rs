//! Book record and registration payload.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::{BookId, UserId};

/// Catalog entry for a single title.
///
/// `copies_total` is fixed at registration; `copies_available` moves between
/// `0` and `copies_total` as copies are lent and returned. `reservations` is
/// the FIFO queue of users waiting for a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Stable book identifier.
    pub id: BookId,
    /// Title as registered.
    pub title: String,
    /// Author as registered.
    pub author: String,
    /// Publication year.
    pub year: i32,
    /// Copies owned by the library.
    pub copies_total: u32,
    /// Copies currently on the shelf.
    pub copies_available: u32,
    /// Users waiting for a copy, earliest first.
    pub reservations: VecDeque<UserId>,
}

/// Registration payload used to create a new [`Book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    /// Stable book identifier.
    pub id: BookId,
    /// Title as registered.
    pub title: String,
    /// Author as registered.
    pub author: String,
    /// Publication year.
    pub year: i32,
    /// Copies owned by the library.
    pub copies_total: u32,
}
