//! # Concurrent paginated streaming for Rust
//!
//! This crate pulls every item out of a paginated source and streams it to a
//! single consumer. The source only has to answer two questions: how many
//! items there are, and what a given page holds.
//!
//! ## Core Concepts
//!
//! - **PagedSource**: the collaborator, exposing `count` and `fetch_page`
//! - **PagePlan**: the ordered, gap-free page windows covering the count
//! - **Pipeline**: fetches the plan sequentially or on a capped worker pool
//! - **PageStream**: the items, plus a single-shot error slot
//!
//! The first error wins: a failing page or an elapsed deadline stops every
//! other fetch, closes the stream, and is the only error the consumer sees.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use pagestream::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut stream = Pipeline::new(NumberSource::new(100))
//!         .page_size(10)
//!         .max_concurrency(4)
//!         .deadline(Duration::from_secs(1))
//!         .spawn();
//!
//!     let mut total = 0;
//!     while let Some(n) = stream.recv().await {
//!         total += n;
//!     }
//!     assert_eq!(total, (0..100).sum::<usize>());
//!
//!     stream.finish().await
//! }
//! ```

pub mod core;
pub mod pagination;
pub mod pipeline;
pub mod sources;
pub mod stream;

mod telemetry;

// Re-export commonly used items
pub mod prelude {
    pub use crate::core::{Error, IntoError, PagedSource, Result};
    pub use crate::pagination::{plan, PagePlan, Pagination, PartialPage};
    pub use crate::pipeline::{FetchMode, Pipeline, PipelineConfig, PipelineState};
    pub use crate::sources::*;
    pub use crate::stream::{ErrorSlot, ItemStream, PageStream};
}

// Re-export main error type
pub use crate::core::{Error, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
