// Keyward — Store error types

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Key '{key}' is owned by another user")]
    OwnershipConflict { key: String },

    #[error("Key must not be empty")]
    EmptyKey,

    #[error("No acting identity supplied")]
    MissingIdentity,

    #[error("Store engine has been closed")]
    EngineClosed,
}
