//! Authoritative in-memory library lending: catalog, membership, FIFO
//! reservations, and single-level undo.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::LibraryStore`]:
//! ```
//! use lendlog::{book::BookDraft, core::store::LibraryStore, user::UserDraft};
//!
//! let mut store = LibraryStore::new();
//! store.add_book(BookDraft {
//!     id: "B001".to_string(),
//!     title: "Dune".to_string(),
//!     author: "Frank Herbert".to_string(),
//!     year: 1965,
//!     copies_total: 2,
//! }).expect("register book");
//! store.add_user(UserDraft {
//!     id: "U001".to_string(),
//!     name: "Ana".to_string(),
//!     email: "ana@example.com".to_string(),
//! }).expect("register user");
//!
//! let outcome = store.borrow("U001", "B001").expect("borrow");
//! println!("{outcome}");
//! assert_eq!(store.book("B001").map(|b| b.copies_available), Some(1));
//! ```
//!
//! Single-writer runtime for concurrent callers:
//! ```
//! use lendlog::{
//!     book::BookDraft,
//!     core::store::LibraryStore,
//!     runtime::handle::{spawn_lendlog, RuntimeConfig},
//!     user::UserDraft,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let handle = spawn_lendlog(LibraryStore::new(), RuntimeConfig::default());
//! handle.register_book(BookDraft {
//!     id: "B001".to_string(),
//!     title: "Dune".to_string(),
//!     author: "Frank Herbert".to_string(),
//!     year: 1965,
//!     copies_total: 1,
//! }).await.expect("register book");
//! handle.register_user(UserDraft {
//!     id: "U001".to_string(),
//!     name: "Ana".to_string(),
//!     email: "ana@example.com".to_string(),
//! }).await.expect("register user");
//! let _outcome = handle.borrow("U001", "B001").await.expect("borrow");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Book record and registration payload.
pub mod book;
/// Core in-memory store and lending engine.
pub mod core;
/// Reversible operation model for undo.
pub mod op;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared identifier aliases.
pub mod types;
/// User record and registration payload.
pub mod user;
