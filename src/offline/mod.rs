//! Point-of-sale offline queue: sales recorded while the terminal has no
//! connection, replayed against the server once it comes back.

pub mod store;
pub mod submitter;
pub mod sync;

pub use store::{CartItem, OfflineSale, OfflineStore};
pub use submitter::{RpcSubmitter, TicketSubmitter};
pub use sync::{Reconciler, SyncReport};

#[derive(Debug)]
pub enum OfflineError {
    Storage(sqlx::Error),
    Transport(String),
    Rejected(String),
    InvalidSale(String),
}

impl std::fmt::Display for OfflineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfflineError::Storage(err) => write!(f, "Local storage error: {err}"),
            OfflineError::Transport(msg) => write!(f, "Server unreachable: {msg}"),
            OfflineError::Rejected(msg) => write!(f, "Server rejected sale: {msg}"),
            OfflineError::InvalidSale(msg) => write!(f, "Invalid sale: {msg}"),
        }
    }
}

impl std::error::Error for OfflineError {}

impl From<sqlx::Error> for OfflineError {
    fn from(err: sqlx::Error) -> Self {
        OfflineError::Storage(err)
    }
}
