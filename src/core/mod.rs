//! Core traits and types for the pagestream library.
//!
//! This module contains the error type and the source trait that define
//! how the pipeline talks to its collaborator.

pub mod error;
pub mod traits;

// Re-export core items
pub use error::{Error, IntoError, Result};
pub use traits::PagedSource;
