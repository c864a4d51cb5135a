use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{
    book::{Book, BookDraft},
    core::store::{LibraryStore, Outcome, StoreError},
    user::{User, UserDraft},
};

use super::events::LendingEvent;

/// Error surfaced by [`LendLogHandle`] calls.
#[derive(Debug)]
pub enum RuntimeError {
    /// The store rejected the operation.
    Store(StoreError),
    /// The runtime task is gone.
    ChannelClosed,
}

impl From<StoreError> for RuntimeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Channel sizing for the runtime loop.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Bound of the command channel.
    pub cmd_queue_bound: usize,
    /// Capacity of the broadcast event stream.
    pub events_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cmd_queue_bound: 256,
            events_capacity: 1024,
        }
    }
}

/// Cloneable handle to the single-writer lending loop.
///
/// The store lives on a dedicated task and applies commands strictly in
/// arrival order, so concurrent callers never interleave mutations.
pub struct LendLogHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<LendingEvent>,
}

impl Clone for LendLogHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    RegisterBook {
        draft: BookDraft,
        resp: oneshot::Sender<Result<Outcome, RuntimeError>>,
    },
    RegisterUser {
        draft: UserDraft,
        resp: oneshot::Sender<Result<Outcome, RuntimeError>>,
    },
    Borrow {
        user_id: String,
        book_id: String,
        resp: oneshot::Sender<Result<Outcome, RuntimeError>>,
    },
    Return {
        user_id: String,
        book_id: String,
        resp: oneshot::Sender<Result<Outcome, RuntimeError>>,
    },
    Undo {
        resp: oneshot::Sender<Result<Outcome, RuntimeError>>,
    },
    GetBook {
        book_id: String,
        resp: oneshot::Sender<Option<Book>>,
    },
    GetUser {
        user_id: String,
        resp: oneshot::Sender<Option<User>>,
    },
    ListBooks {
        resp: oneshot::Sender<Vec<Book>>,
    },
    ListUsers {
        resp: oneshot::Sender<Vec<User>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Spawns the single-writer loop around `store` and returns its handle.
pub fn spawn_lendlog(store: LibraryStore, config: RuntimeConfig) -> LendLogHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.cmd_queue_bound);
    let (events_tx, _) = broadcast::channel::<LendingEvent>(config.events_capacity);

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut store = store;
        loop {
            let Some(cmd) = cmd_rx.recv().await else { break };
            if handle_command(cmd, &mut store, &events_tx_loop) {
                break;
            }
        }
    });

    LendLogHandle { cmd_tx, events_tx }
}

impl LendLogHandle {
    /// Subscribes to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<LendingEvent> {
        self.events_tx.subscribe()
    }

    /// Registers a book.
    pub async fn register_book(&self, draft: BookDraft) -> Result<Outcome, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RegisterBook { draft, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Registers a user.
    pub async fn register_user(&self, draft: UserDraft) -> Result<Outcome, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RegisterUser { draft, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Lends a copy to the user, or queues them when none is available.
    pub async fn borrow(
        &self,
        user_id: impl Into<String>,
        book_id: impl Into<String>,
    ) -> Result<Outcome, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Borrow {
                user_id: user_id.into(),
                book_id: book_id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Takes a copy back and serves the reservation queue.
    pub async fn return_book(
        &self,
        user_id: impl Into<String>,
        book_id: impl Into<String>,
    ) -> Result<Outcome, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Return {
                user_id: user_id.into(),
                book_id: book_id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Reverses the most recent loan or return.
    pub async fn undo(&self) -> Result<Outcome, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Undo { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Cloned book snapshot by id.
    pub async fn book(&self, book_id: impl Into<String>) -> Result<Option<Book>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::GetBook {
                book_id: book_id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Cloned user snapshot by id.
    pub async fn user(&self, user_id: impl Into<String>) -> Result<Option<User>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::GetUser {
                user_id: user_id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Cloned catalog snapshot in registration order.
    pub async fn books(&self) -> Result<Vec<Book>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ListBooks { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Cloned membership snapshot in registration order.
    pub async fn users(&self) -> Result<Vec<User>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ListUsers { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Stops the runtime loop after in-flight commands drain.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

fn handle_command(
    cmd: Command,
    store: &mut LibraryStore,
    events_tx: &broadcast::Sender<LendingEvent>,
) -> bool {
    match cmd {
        Command::RegisterBook { draft, resp } => {
            let res = store.add_book(draft).map_err(RuntimeError::from);
            emit(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::RegisterUser { draft, resp } => {
            let res = store.add_user(draft).map_err(RuntimeError::from);
            emit(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::Borrow {
            user_id,
            book_id,
            resp,
        } => {
            let res = store.borrow(&user_id, &book_id).map_err(RuntimeError::from);
            emit(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::Return {
            user_id,
            book_id,
            resp,
        } => {
            let res = store
                .return_book(&user_id, &book_id)
                .map_err(RuntimeError::from);
            emit(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::Undo { resp } => {
            let res = store.undo_last().map_err(RuntimeError::from);
            emit(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::GetBook { book_id, resp } => {
            let _ = resp.send(store.book_cloned(&book_id));
        }
        Command::GetUser { user_id, resp } => {
            let _ = resp.send(store.user_cloned(&user_id));
        }
        Command::ListBooks { resp } => {
            let _ = resp.send(store.books_cloned());
        }
        Command::ListUsers { resp } => {
            let _ = resp.send(store.users_cloned());
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

fn emit(events_tx: &broadcast::Sender<LendingEvent>, res: &Result<Outcome, RuntimeError>) {
    let Ok(outcome) = res else { return };
    let event = match outcome {
        Outcome::BookRegistered { book_id, .. } => LendingEvent::BookRegistered {
            book_id: book_id.clone(),
        },
        Outcome::UserRegistered { user_id, .. } => LendingEvent::UserRegistered {
            user_id: user_id.clone(),
        },
        Outcome::Loaned {
            user_id, book_id, ..
        } => LendingEvent::Loaned {
            user_id: user_id.clone(),
            book_id: book_id.clone(),
        },
        Outcome::Queued {
            user_id,
            book_id,
            position,
            ..
        } => LendingEvent::Queued {
            user_id: user_id.clone(),
            book_id: book_id.clone(),
            position: *position,
        },
        Outcome::Returned {
            user_id,
            book_id,
            promotion,
            ..
        } => LendingEvent::Returned {
            user_id: user_id.clone(),
            book_id: book_id.clone(),
            promoted: promotion.as_ref().map(|p| p.user_id.clone()),
        },
        Outcome::UndidLoan { .. } | Outcome::UndidReturn { .. } => LendingEvent::UndoApplied,
        Outcome::AlreadyQueued { .. } | Outcome::NothingToUndo => return,
    };
    let _ = events_tx.send(event);
}
