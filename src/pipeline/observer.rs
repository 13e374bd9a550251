use std::path::{Path, PathBuf};

use crate::pipeline::batch::{BatchReport, DocumentOutcome, DocumentReport};

/// Receives progress callbacks from a [`BatchOrchestrator`](crate::BatchOrchestrator).
///
/// Callbacks arrive in processing order on the calling thread. Every method has an empty default.
pub trait ProgressObserver {
    /// A document is about to be processed; `index` is 1-based.
    fn document_started(&mut self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// A top-level layer is about to be rasterized; `index` is 1-based out of `total`.
    fn layer_started(&mut self, document: &Path, index: usize, total: usize, name: &str) {
        let _ = (document, index, total, name);
    }

    /// One layer asset was written and recorded.
    fn layer_written(&mut self, document: &Path, order_index: usize, asset: &Path) {
        let _ = (document, order_index, asset);
    }

    /// A document reached a final state.
    fn document_finished(&mut self, report: &DocumentReport) {
        let _ = report;
    }

    /// The batch ran to completion.
    fn batch_finished(&mut self, report: &BatchReport) {
        let _ = report;
    }
}

/// Reports progress through `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn document_started(&mut self, index: usize, total: usize, path: &Path) {
        tracing::info!("[{index}/{total}] {}", path.display());
    }

    fn layer_started(&mut self, _document: &Path, index: usize, total: usize, name: &str) {
        tracing::info!("[{index}/{total}] {name}");
    }

    fn layer_written(&mut self, document: &Path, order_index: usize, asset: &Path) {
        tracing::debug!(
            document = %document.display(),
            order_index,
            "layer written to {}",
            asset.display()
        );
    }

    fn document_finished(&mut self, report: &DocumentReport) {
        let path = report.path.display();
        match &report.outcome {
            DocumentOutcome::Committed { layers } => {
                tracing::debug!(%path, layers, "document committed");
            }
            DocumentOutcome::Aborted {
                layers_written,
                error,
            } => {
                tracing::error!(%path, layers_written, "document aborted: {error}");
            }
            DocumentOutcome::FailedToOpen { error } => {
                tracing::error!(%path, "failed to open document: {error}");
            }
            DocumentOutcome::Skipped { reason } => {
                tracing::warn!(%path, "skipped: {reason}");
            }
        }
    }

    fn batch_finished(&mut self, report: &BatchReport) {
        tracing::info!(
            committed = report.committed,
            failed = report.failed,
            skipped = report.skipped,
            layers = report.layers_written,
            "batch finished"
        );
    }
}

/// One observed callback, as captured by [`RecordingObserver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// See [`ProgressObserver::document_started`].
    DocumentStarted {
        /// 1-based position in the batch.
        index: usize,
        /// Batch size.
        total: usize,
        /// Document path.
        path: PathBuf,
    },
    /// See [`ProgressObserver::layer_started`].
    LayerStarted {
        /// 1-based position among the document's top-level layers.
        index: usize,
        /// Top-level layer count.
        total: usize,
        /// Layer name.
        name: String,
    },
    /// See [`ProgressObserver::layer_written`].
    LayerWritten {
        /// Document path.
        document: PathBuf,
        /// Layer position.
        order_index: usize,
        /// Written asset.
        asset: PathBuf,
    },
    /// See [`ProgressObserver::document_finished`].
    DocumentFinished(DocumentReport),
    /// See [`ProgressObserver::batch_finished`].
    BatchFinished {
        /// Committed documents.
        committed: usize,
        /// Aborted or unreadable documents.
        failed: usize,
        /// Duplicate documents.
        skipped: usize,
    },
}

/// Captures every callback in memory, for tests and debugging.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Vec<ProgressEvent>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the captured events.
    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }
}

impl ProgressObserver for RecordingObserver {
    fn document_started(&mut self, index: usize, total: usize, path: &Path) {
        self.events.push(ProgressEvent::DocumentStarted {
            index,
            total,
            path: path.to_path_buf(),
        });
    }

    fn layer_started(&mut self, _document: &Path, index: usize, total: usize, name: &str) {
        self.events.push(ProgressEvent::LayerStarted {
            index,
            total,
            name: name.to_string(),
        });
    }

    fn layer_written(&mut self, document: &Path, order_index: usize, asset: &Path) {
        self.events.push(ProgressEvent::LayerWritten {
            document: document.to_path_buf(),
            order_index,
            asset: asset.to_path_buf(),
        });
    }

    fn document_finished(&mut self, report: &DocumentReport) {
        self.events.push(ProgressEvent::DocumentFinished(report.clone()));
    }

    fn batch_finished(&mut self, report: &BatchReport) {
        self.events.push(ProgressEvent::BatchFinished {
            committed: report.committed,
            failed: report.failed,
            skipped: report.skipped,
        });
    }
}
