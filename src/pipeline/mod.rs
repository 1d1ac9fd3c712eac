//! Pipeline orchestration and execution.
//!
//! A [`Pipeline`] asks a [`PagedSource`] for its item count, plans the
//! pages, fetches them sequentially or on a capped worker pool, and streams
//! every item into a single [`PageStream`].

mod orchestrator;
mod scope;
mod task;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};

use crate::core::PagedSource;
use crate::pagination::PartialPage;
use crate::stream::PageStream;

use orchestrator::Outputs;
use scope::RunScope;

/// How pages are fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FetchMode {
    /// One page at a time, in plan order. Items arrive in global order.
    Sequential,
    /// Pages fetched by a pool of workers. Only order within a page is kept.
    #[default]
    Concurrent,
}

/// Lifecycle of one pipeline run. `Closed` is reached exactly once.
///
/// A run that fails before any page is fetched goes from `Planning`
/// straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Planning,
    Fetching,
    Draining,
    Closed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Planning => "planning",
            PipelineState::Fetching => "fetching",
            PipelineState::Draining => "draining",
            PipelineState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Configuration for pipeline execution
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Items per page
    pub page_size: usize,
    /// Maximum number of pages fetched at once in concurrent mode
    pub max_concurrency: usize,
    /// Capacity of the item channel
    pub buffer_size: usize,
    /// End-to-end deadline for the whole run; `None` disables it
    pub deadline: Option<Duration>,
    /// Sequential or concurrent fetching
    pub mode: FetchMode,
    /// Whether a short trailing page is fetched
    pub partial_page: PartialPage,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_concurrency: 8,
            buffer_size: 1,
            deadline: Some(Duration::from_secs(30)),
            mode: FetchMode::Concurrent,
            partial_page: PartialPage::Include,
        }
    }
}

/// A paginated fetch pipeline over one source.
pub struct Pipeline<S> {
    source: Arc<S>,
    config: PipelineConfig,
}

impl<S> Pipeline<S>
where
    S: PagedSource + 'static,
{
    /// Create a new pipeline
    pub fn new(source: S) -> Self {
        Self::from_arc(Arc::new(source))
    }

    /// Create a pipeline over a source that is shared with other owners
    pub fn from_arc(source: Arc<S>) -> Self {
        Self {
            source,
            config: PipelineConfig::default(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the page size
    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    /// Set the maximum concurrency
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.config.max_concurrency = max;
        self
    }

    /// Set the item channel capacity
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// Set the end-to-end deadline
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = Some(deadline);
        self
    }

    /// Run without a deadline; only cancellation stops the run early
    pub fn no_deadline(mut self) -> Self {
        self.config.deadline = None;
        self
    }

    /// Set the fetch mode
    pub fn mode(mut self, mode: FetchMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Fetch pages one at a time
    pub fn sequential(self) -> Self {
        self.mode(FetchMode::Sequential)
    }

    /// Fetch pages on a worker pool
    pub fn concurrent(self) -> Self {
        self.mode(FetchMode::Concurrent)
    }

    /// Set the trailing partial page policy
    pub fn partial_page(mut self, partial: PartialPage) -> Self {
        self.config.partial_page = partial;
        self
    }

    /// Start the pipeline on the current tokio runtime and return
    /// immediately.
    ///
    /// The run observes a child of `token`: cancelling `token` stops the
    /// run, while a failing page only stops this run.
    pub fn run(self, token: &CancellationToken) -> PageStream<S::Item> {
        let Pipeline { source, config } = self;

        let (tx, rx) = mpsc::channel(config.buffer_size.max(1));
        let (error_tx, error_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(PipelineState::Planning);
        let scope = Arc::new(RunScope::new(token.child_token(), config.deadline));
        let run_token = scope.token().clone();

        let span = info_span!(
            "pipeline",
            mode = ?config.mode,
            page_size = config.page_size,
            max_concurrency = config.max_concurrency,
        );
        let outputs = Outputs {
            items: tx,
            error: error_tx,
            state: state_tx,
        };
        tokio::spawn(orchestrator::drive(source, config, scope, outputs).instrument(span));

        PageStream::new(rx, error_rx, state_rx, run_token)
    }

    /// Start the pipeline with its own cancellation token
    pub fn spawn(self) -> PageStream<S::Item> {
        self.run(&CancellationToken::new())
    }
}
