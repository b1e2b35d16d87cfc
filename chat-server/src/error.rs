//! Error taxonomy. `main` matches on [`ChatError`] to pick an exit code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Usage: server authfile [port]")]
    Usage,

    #[error("Communications error")]
    Communications(#[from] std::io::Error),
}

impl ChatError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ChatError::Usage => 1,
            ChatError::Communications(_) => 2,
        }
    }
}
