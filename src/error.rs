//! Aura SDK error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::controller::{Controller, Family};

/// Error type for all facade operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuraError {
    /// Vendor library could not be located or loaded.
    #[error("unable to load {}: {reason}", .path.display())]
    LoadFailure {
        /// Library path passed to the loader.
        path: PathBuf,
        /// Loader error message.
        reason: String,
    },

    /// Operation issued while no library is loaded.
    #[error("Aura SDK is not loaded")]
    NotLoaded,

    /// The loaded library does not export the required entry point.
    #[error("unsupported operation: {symbol} is not exported by the Aura SDK")]
    Unsupported {
        /// Name of the missing symbol.
        symbol: &'static str,
    },

    /// The operation does not exist for this controller family.
    #[error("{operation} is not available for {family} controllers")]
    NotApplicable { family: Family, operation: &'static str },

    /// Controller discovery for one family failed.
    #[error("unable to enumerate {family} controllers: {reason}")]
    Discovery { family: Family, reason: String },

    /// Index out of range or single-instance controller absent.
    #[error("no such controller: {0}")]
    NoController(Controller),

    #[error("color buffer is empty")]
    EmptyColorBuffer,

    #[error("color buffer of {len} bytes exceeds the SDK limit")]
    BufferTooLarge { len: usize },
}

impl AuraError {
    /// Check if the error only signals that there was nothing to operate on.
    ///
    /// Hosts which prefer a permissive contract can treat these as no-ops.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::NotLoaded | Self::NoController(_))
    }
}
