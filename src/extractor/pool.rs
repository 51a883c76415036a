//! Worker pool for blocking extraction calls.
//!
//! The bot runs on a single cooperative scheduler; extraction blocks for
//! seconds. Each call is moved to tokio's blocking thread pool, and a
//! semaphore caps how many run at once.

use super::{Extraction, FailureKind, LinkExtractor};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

/// Bounded, fire-and-await dispatcher for a [`LinkExtractor`].
#[derive(Clone)]
pub struct ExtractionPool {
    extractor: Arc<dyn LinkExtractor>,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl ExtractionPool {
    /// Wrap `extractor`, allowing at most `workers` concurrent calls.
    ///
    /// A worker count of zero is treated as one.
    #[must_use]
    pub fn new(extractor: Arc<dyn LinkExtractor>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            extractor,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    /// Maximum number of concurrent extractions.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Resolve `url` on a blocking worker and wait for the result.
    ///
    /// Never returns early: the caller is suspended until the worker is done.
    /// A panicking extractor is reported as [`FailureKind::Internal`].
    pub async fn extract(&self, url: &str) -> Extraction {
        let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
            return Extraction::failed(FailureKind::Internal, "extraction pool is closed");
        };

        debug!(
            url = %url,
            available = self.permits.available_permits(),
            "Dispatching extraction to worker"
        );

        let extractor = Arc::clone(&self.extractor);
        let url = url.to_owned();
        let job = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            extractor.extract(&url)
        });

        match job.await {
            Ok(extraction) => extraction,
            Err(e) => {
                error!(error = %e, "Extraction worker terminated abnormally");
                Extraction::failed(
                    FailureKind::Internal,
                    format!("extraction worker failed: {e}"),
                )
            }
        }
    }
}
