use std::{collections::VecDeque, fmt};

use hashbrown::HashMap;

use crate::{
    book::{Book, BookDraft},
    op::Op,
    types::{BookId, UserId},
    user::{User, UserDraft},
};

/// Domain failure reported to the caller. Never fatal; the store is left
/// untouched by the failing operation (undo excepted, which consumes its
/// record either way).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A book with this id is already registered.
    DuplicateBook(BookId),
    /// A user with this id is already registered.
    DuplicateUser(UserId),
    /// No book with this id exists.
    MissingBook(BookId),
    /// No user with this id exists.
    MissingUser(UserId),
    /// The user does not currently hold this book.
    NotBorrowed {
        /// User attempting the return.
        user_id: UserId,
        /// Book that is not in their holdings.
        book_id: BookId,
    },
    /// The last operation could not be reversed; its record is discarded.
    UndoFailed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateBook(id) => write!(f, "a book with id {id} already exists"),
            Self::DuplicateUser(id) => write!(f, "a user with id {id} already exists"),
            Self::MissingBook(id) => write!(f, "no book with id {id}"),
            Self::MissingUser(id) => write!(f, "no user with id {id}"),
            Self::NotBorrowed { user_id, book_id } => {
                write!(f, "user {user_id} has not borrowed {book_id}")
            }
            Self::UndoFailed => write!(f, "could not undo the last operation"),
        }
    }
}

/// Reservation-queue promotion applied during a return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    /// User the copy was re-lent to.
    pub user_id: UserId,
    /// Their display name, for reporting.
    pub name: String,
}

/// Successful (or informational) result of a mutating call.
///
/// Carries the ids, display names, and counts the activity-log message needs;
/// [`fmt::Display`] renders that message. Callers wanting structured handling
/// match on the variant instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A book was added to the catalog.
    BookRegistered {
        /// New book id.
        book_id: BookId,
        /// Registered title.
        title: String,
    },
    /// A user was added to the membership.
    UserRegistered {
        /// New user id.
        user_id: UserId,
        /// Registered name.
        name: String,
    },
    /// A copy was lent directly.
    Loaned {
        /// Borrowing user.
        user_id: UserId,
        /// Book lent.
        book_id: BookId,
        /// Book title.
        title: String,
        /// Borrower name.
        name: String,
        /// Copies left on the shelf.
        available: u32,
    },
    /// No copy was available; the user joined the reservation queue.
    Queued {
        /// Waiting user.
        user_id: UserId,
        /// Book waited on.
        book_id: BookId,
        /// Book title.
        title: String,
        /// Waiting user's name.
        name: String,
        /// 1-indexed position in the queue.
        position: usize,
    },
    /// The user was already in the reservation queue; nothing changed.
    AlreadyQueued {
        /// Waiting user.
        user_id: UserId,
        /// Book waited on.
        book_id: BookId,
        /// Book title.
        title: String,
        /// Waiting user's name.
        name: String,
    },
    /// A copy was returned, possibly re-lent to the head of the queue.
    Returned {
        /// Returning user.
        user_id: UserId,
        /// Book returned.
        book_id: BookId,
        /// Book title.
        title: String,
        /// Copies on the shelf after the return (and any promotion).
        available: u32,
        /// Promotion applied as part of the same return, if any.
        promotion: Option<Promotion>,
    },
    /// The most recent loan was reversed.
    UndidLoan {
        /// User whose loan was reversed.
        user_id: UserId,
        /// Book restored to the shelf.
        book_id: BookId,
        /// Book title.
        title: String,
        /// User name.
        name: String,
    },
    /// The most recent return (and any promotion) was reversed.
    UndidReturn {
        /// User holding the book again.
        user_id: UserId,
        /// Book re-lent.
        book_id: BookId,
        /// Book title.
        title: String,
        /// User name.
        name: String,
    },
    /// The undo slot was empty; nothing changed.
    NothingToUndo,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BookRegistered { title, .. } => write!(f, "book '{title}' registered"),
            Self::UserRegistered { name, .. } => write!(f, "user '{name}' registered"),
            Self::Loaned {
                title,
                name,
                available,
                ..
            } => write!(f, "lent '{title}' to {name}; {available} available"),
            Self::Queued {
                title,
                name,
                position,
                ..
            } => write!(
                f,
                "no copies of '{title}' left; {name} queued at position {position}"
            ),
            Self::AlreadyQueued { title, name, .. } => {
                write!(f, "{name} is already waiting for '{title}'")
            }
            Self::Returned {
                title,
                available,
                promotion: Some(p),
                ..
            } => write!(
                f,
                "'{title}' returned and lent on to {}; {available} available",
                p.name
            ),
            Self::Returned {
                title, available, ..
            } => write!(f, "'{title}' returned; {available} available"),
            Self::UndidLoan { title, name, .. } => {
                write!(f, "undid loan of '{title}' to {name}")
            }
            Self::UndidReturn { title, name, .. } => {
                write!(f, "undid return of '{title}' by {name}")
            }
            Self::NothingToUndo => write!(f, "nothing to undo"),
        }
    }
}

/// Authoritative in-memory library state: catalog, membership, and the
/// single-slot undo record.
///
/// All mutation goes through the methods here; records are handed out only
/// by reference or as clones. Each operation either applies fully or, on a
/// precondition failure, leaves the store untouched.
#[derive(Debug, Default)]
pub struct LibraryStore {
    books: HashMap<BookId, Book>,
    book_order: Vec<BookId>,
    users: HashMap<UserId, User>,
    user_order: Vec<UserId>,
    last_op: Option<Op>,
}

impl LibraryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a book; `copies_available` starts at `copies_total`.
    pub fn add_book(&mut self, draft: BookDraft) -> Result<Outcome, StoreError> {
        if self.books.contains_key(&draft.id) {
            return Err(StoreError::DuplicateBook(draft.id));
        }

        let book = Book {
            id: draft.id,
            title: draft.title,
            author: draft.author,
            year: draft.year,
            copies_total: draft.copies_total,
            copies_available: draft.copies_total,
            reservations: VecDeque::new(),
        };

        let outcome = Outcome::BookRegistered {
            book_id: book.id.clone(),
            title: book.title.clone(),
        };
        self.book_order.push(book.id.clone());
        self.books.insert(book.id.clone(), book);
        Ok(outcome)
    }

    /// Registers a user with no holdings.
    pub fn add_user(&mut self, draft: UserDraft) -> Result<Outcome, StoreError> {
        if self.users.contains_key(&draft.id) {
            return Err(StoreError::DuplicateUser(draft.id));
        }

        let user = User {
            id: draft.id,
            name: draft.name,
            email: draft.email,
            borrowed: Vec::new(),
        };

        let outcome = Outcome::UserRegistered {
            user_id: user.id.clone(),
            name: user.name.clone(),
        };
        self.user_order.push(user.id.clone());
        self.users.insert(user.id.clone(), user);
        Ok(outcome)
    }

    /// Lends a copy to the user, or queues them when none is available.
    ///
    /// Queue joins are idempotent ([`Outcome::AlreadyQueued`]) and are not
    /// recorded in the undo slot; direct loans are.
    pub fn borrow(&mut self, user_id: &str, book_id: &str) -> Result<Outcome, StoreError> {
        let Some(user) = self.users.get_mut(user_id) else {
            return Err(StoreError::MissingUser(user_id.to_owned()));
        };
        let Some(book) = self.books.get_mut(book_id) else {
            return Err(StoreError::MissingBook(book_id.to_owned()));
        };

        if book.copies_available > 0 {
            book.copies_available -= 1;
            user.borrowed.push(book.id.clone());
            self.last_op = Some(Op::Borrow {
                user_id: user.id.clone(),
                book_id: book.id.clone(),
            });
            return Ok(Outcome::Loaned {
                user_id: user.id.clone(),
                book_id: book.id.clone(),
                title: book.title.clone(),
                name: user.name.clone(),
                available: book.copies_available,
            });
        }

        if book.reservations.iter().any(|waiting| waiting == user_id) {
            return Ok(Outcome::AlreadyQueued {
                user_id: user.id.clone(),
                book_id: book.id.clone(),
                title: book.title.clone(),
                name: user.name.clone(),
            });
        }

        book.reservations.push_back(user.id.clone());
        Ok(Outcome::Queued {
            user_id: user.id.clone(),
            book_id: book.id.clone(),
            title: book.title.clone(),
            name: user.name.clone(),
            position: book.reservations.len(),
        })
    }

    /// Takes a copy back and serves the reservation queue.
    ///
    /// If the queue head still exists the copy is re-lent to them as part of
    /// the same operation; a vanished head is dropped without consulting the
    /// next entry. Both the return and any promotion are reversed by a single
    /// undo.
    pub fn return_book(&mut self, user_id: &str, book_id: &str) -> Result<Outcome, StoreError> {
        if !self.users.contains_key(user_id) {
            return Err(StoreError::MissingUser(user_id.to_owned()));
        }
        if !self.books.contains_key(book_id) {
            return Err(StoreError::MissingBook(book_id.to_owned()));
        }

        {
            let Some(user) = self.users.get_mut(user_id) else {
                return Err(StoreError::MissingUser(user_id.to_owned()));
            };
            let Some(pos) = user.borrowed.iter().position(|held| held == book_id) else {
                return Err(StoreError::NotBorrowed {
                    user_id: user_id.to_owned(),
                    book_id: book_id.to_owned(),
                });
            };
            user.borrowed.remove(pos);
        }

        let Some(book) = self.books.get_mut(book_id) else {
            return Err(StoreError::MissingBook(book_id.to_owned()));
        };
        book.copies_available += 1;

        let mut promotion = None;
        if let Some(next_id) = book.reservations.pop_front() {
            if let Some(next_user) = self.users.get_mut(&next_id) {
                book.copies_available -= 1;
                next_user.borrowed.push(book.id.clone());
                promotion = Some(Promotion {
                    user_id: next_user.id.clone(),
                    name: next_user.name.clone(),
                });
            }
            // A vanished head is dropped silently; the return stands on its own.
        }

        self.last_op = Some(Op::Return {
            user_id: user_id.to_owned(),
            book_id: book.id.clone(),
            promoted: promotion.as_ref().map(|p| p.user_id.clone()),
        });
        Ok(Outcome::Returned {
            user_id: user_id.to_owned(),
            book_id: book.id.clone(),
            title: book.title.clone(),
            available: book.copies_available,
            promotion,
        })
    }

    /// Reverses the most recent loan or return.
    ///
    /// The undo slot holds exactly one record; an empty slot reports
    /// [`Outcome::NothingToUndo`]. The record is consumed even when the
    /// reversal fails because state has since diverged.
    pub fn undo_last(&mut self) -> Result<Outcome, StoreError> {
        let Some(op) = self.last_op.take() else {
            return Ok(Outcome::NothingToUndo);
        };

        match op {
            Op::Borrow { user_id, book_id } => self.undo_borrow(user_id, book_id),
            Op::Return {
                user_id,
                book_id,
                promoted,
            } => self.undo_return(user_id, book_id, promoted),
        }
    }

    fn undo_borrow(&mut self, user_id: UserId, book_id: BookId) -> Result<Outcome, StoreError> {
        let Some(book) = self.books.get_mut(&book_id) else {
            return Err(StoreError::UndoFailed);
        };
        let Some(user) = self.users.get_mut(&user_id) else {
            return Err(StoreError::UndoFailed);
        };
        let Some(pos) = user.borrowed.iter().position(|held| *held == book_id) else {
            return Err(StoreError::UndoFailed);
        };

        user.borrowed.remove(pos);
        book.copies_available += 1;
        Ok(Outcome::UndidLoan {
            title: book.title.clone(),
            name: user.name.clone(),
            user_id,
            book_id,
        })
    }

    fn undo_return(
        &mut self,
        user_id: UserId,
        book_id: BookId,
        promoted: Option<UserId>,
    ) -> Result<Outcome, StoreError> {
        if !self.users.contains_key(&user_id) || !self.books.contains_key(&book_id) {
            return Err(StoreError::UndoFailed);
        }

        // Reverse the promotion first, restoring the promoted user to the
        // front of the queue — they were about to be served.
        if let Some(promoted_id) = promoted {
            if let Some(next_user) = self.users.get_mut(&promoted_id) {
                if let Some(pos) = next_user.borrowed.iter().position(|held| *held == book_id) {
                    next_user.borrowed.remove(pos);
                    let Some(book) = self.books.get_mut(&book_id) else {
                        return Err(StoreError::UndoFailed);
                    };
                    book.copies_available += 1;
                    book.reservations.push_front(promoted_id);
                }
            }
        }

        let Some(book) = self.books.get_mut(&book_id) else {
            return Err(StoreError::UndoFailed);
        };
        if book.copies_available == 0 {
            return Err(StoreError::UndoFailed);
        }
        book.copies_available -= 1;
        let title = book.title.clone();

        let Some(user) = self.users.get_mut(&user_id) else {
            return Err(StoreError::UndoFailed);
        };
        user.borrowed.push(book_id.clone());
        Ok(Outcome::UndidReturn {
            name: user.name.clone(),
            title,
            user_id,
            book_id,
        })
    }

    /// Looks up a book by id.
    pub fn book(&self, book_id: &str) -> Option<&Book> {
        self.books.get(book_id)
    }

    /// Looks up a user by id.
    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// All books in registration order.
    pub fn books(&self) -> Vec<&Book> {
        self.book_order
            .iter()
            .filter_map(|id| self.books.get(id))
            .collect()
    }

    /// All users in registration order.
    pub fn users(&self) -> Vec<&User> {
        self.user_order
            .iter()
            .filter_map(|id| self.users.get(id))
            .collect()
    }

    /// Cloned book snapshot by id.
    pub fn book_cloned(&self, book_id: &str) -> Option<Book> {
        self.book(book_id).cloned()
    }

    /// Cloned user snapshot by id.
    pub fn user_cloned(&self, user_id: &str) -> Option<User> {
        self.user(user_id).cloned()
    }

    /// Cloned catalog snapshot in registration order.
    pub fn books_cloned(&self) -> Vec<Book> {
        self.books().into_iter().cloned().collect()
    }

    /// Cloned membership snapshot in registration order.
    pub fn users_cloned(&self) -> Vec<User> {
        self.users().into_iter().cloned().collect()
    }

    /// True when the undo slot holds a record.
    pub fn has_undo(&self) -> bool {
        self.last_op.is_some()
    }
}
