use std::path::{Path, PathBuf};

use crate::{
    asset::writer::AssetWriter,
    container::tree::{LayerNode, LayerTree},
    foundation::error::{BatchError, DocumentError, StoreError},
    pipeline::observer::ProgressObserver,
    raster::color::to_display_color,
    store::metadata::{AbortPolicy, MetadataStore, NewLayer},
};

/// Batch input and output locations.
#[derive(Clone, Debug)]
pub struct DecomposeOpts {
    /// Directory scanned (non-recursively) for documents.
    pub input_dir: PathBuf,
    /// Root of the per-document asset directories.
    pub output_dir: PathBuf,
    /// File extension of documents, without the dot.
    pub extension: String,
}

impl Default for DecomposeOpts {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("decomposed"),
            extension: "psd".to_string(),
        }
    }
}

/// Final state of one document.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// Every top-level layer was written and recorded.
    Committed {
        /// Number of layers recorded.
        layers: usize,
    },
    /// A layer failed after the document was opened; its layer rows were rolled back.
    Aborted {
        /// Assets written before the failure.
        layers_written: usize,
        /// Failure detail.
        error: String,
    },
    /// The file could not be read or parsed.
    FailedToOpen {
        /// Failure detail.
        error: String,
    },
    /// The document was already recorded.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
}

/// Outcome of one document in a batch.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct DocumentReport {
    /// Source path.
    pub path: PathBuf,
    /// File stem used as document key and asset directory name.
    pub stem: String,
    /// Final state.
    pub outcome: DocumentOutcome,
}

/// Summary of a batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatchReport {
    /// Per-document outcomes, in processing order.
    pub documents: Vec<DocumentReport>,
    /// Documents committed.
    pub committed: usize,
    /// Documents aborted or failed to open.
    pub failed: usize,
    /// Documents skipped as duplicates.
    pub skipped: usize,
    /// Layer rows committed across the batch.
    pub layers_written: usize,
}

impl BatchReport {
    fn push(&mut self, report: DocumentReport) {
        match &report.outcome {
            DocumentOutcome::Committed { layers } => {
                self.committed += 1;
                self.layers_written += layers;
            }
            DocumentOutcome::Aborted { .. } | DocumentOutcome::FailedToOpen { .. } => {
                self.failed += 1;
            }
            DocumentOutcome::Skipped { .. } => self.skipped += 1,
        }
        self.documents.push(report);
    }
}

/// Documents matching `{input_dir}/*.{extension}`, sorted by path.
pub fn enumerate_documents(input_dir: &Path, extension: &str) -> Result<Vec<PathBuf>, BatchError> {
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&input_dir.to_string_lossy()),
        glob::Pattern::escape(extension)
    );
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("cannot read directory entry: {e}");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Drives documents through parse, rasterize, normalize, write, and record.
///
/// Documents and their layers are processed one at a time. A failing document is rolled back and
/// reported; only store failures stop the batch.
#[derive(Debug)]
pub struct BatchOrchestrator<W: AssetWriter> {
    store: MetadataStore,
    writer: W,
    opts: DecomposeOpts,
}

impl<W: AssetWriter> BatchOrchestrator<W> {
    /// Create an orchestrator over an opened store.
    pub fn new(store: MetadataStore, writer: W, opts: DecomposeOpts) -> Self {
        Self {
            store,
            writer,
            opts,
        }
    }

    /// Borrow the metadata store.
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Give the metadata store back.
    pub fn into_store(self) -> MetadataStore {
        self.store
    }

    /// Enumerate the input directory and process every match.
    pub fn run(&mut self, observer: &mut dyn ProgressObserver) -> Result<BatchReport, BatchError> {
        let paths = enumerate_documents(&self.opts.input_dir, &self.opts.extension)?;
        if paths.is_empty() {
            tracing::warn!(
                input_dir = %self.opts.input_dir.display(),
                extension = %self.opts.extension,
                "no documents matched"
            );
        }
        self.run_paths(&paths, observer)
    }

    /// Process the given documents in order.
    pub fn run_paths(
        &mut self,
        paths: &[PathBuf],
        observer: &mut dyn ProgressObserver,
    ) -> Result<BatchReport, BatchError> {
        let mut report = BatchReport::default();
        for (i, path) in paths.iter().enumerate() {
            observer.document_started(i + 1, paths.len(), path);
            let doc = self.process_document(path, observer)?;
            observer.document_finished(&doc);
            report.push(doc);
        }
        observer.batch_finished(&report);
        Ok(report)
    }

    /// Process a single document. Only fatal store errors are returned as `Err`.
    #[tracing::instrument(skip(self, observer), fields(path = %path.display()))]
    pub fn process_document(
        &mut self,
        path: &Path,
        observer: &mut dyn ProgressObserver,
    ) -> Result<DocumentReport, StoreError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source_path = path.to_string_lossy().into_owned();
        let policy = self.store.abort_policy();
        let report = |outcome| DocumentReport {
            path: path.to_path_buf(),
            stem: stem.clone(),
            outcome,
        };

        let handle = match self.store.begin_document(&stem, &source_path) {
            Ok(handle) => handle,
            Err(e @ StoreError::DuplicateDocument { .. }) => {
                return Ok(report(DocumentOutcome::Skipped {
                    reason: e.to_string(),
                }));
            }
            Err(e) => return Err(e),
        };

        let tree = match read_document(path) {
            Ok(tree) => tree,
            Err(e) => {
                handle.abort()?;
                return Ok(report(DocumentOutcome::FailedToOpen {
                    error: e.to_string(),
                }));
            }
        };

        let target_dir = self.opts.output_dir.join(&stem);
        let mut written = Vec::with_capacity(tree.len());
        let total = tree.len();
        for (order_index, layer) in tree.layers.iter().enumerate() {
            observer.layer_started(path, order_index + 1, total, &layer.name);
            let asset = match write_layer(&self.writer, layer, &target_dir, order_index) {
                Ok(asset) => asset,
                Err(e) => {
                    handle.abort()?;
                    if policy == AbortPolicy::Rollback {
                        remove_assets(&self.writer, &written);
                    }
                    return Ok(report(DocumentOutcome::Aborted {
                        layers_written: written.len(),
                        error: format!("layer {order_index} '{}': {e}", layer.name),
                    }));
                }
            };
            handle.record_layer(&NewLayer {
                order_index,
                bbox: layer.bbox,
                name: &layer.name,
                kind: layer.kind.tag(),
                asset_path: &asset,
            })?;
            observer.layer_written(path, order_index, &asset);
            written.push(asset);
        }

        handle.commit()?;
        Ok(report(DocumentOutcome::Committed {
            layers: written.len(),
        }))
    }
}

fn read_document(path: &Path) -> Result<LayerTree, DocumentError> {
    let bytes = std::fs::read(path)?;
    Ok(crate::container::open(&bytes)?)
}

fn write_layer<W: AssetWriter>(
    writer: &W,
    layer: &LayerNode,
    target_dir: &Path,
    order_index: usize,
) -> Result<PathBuf, DocumentError> {
    let raster = layer.composite()?;
    let rgb = to_display_color(raster);
    Ok(writer.write(&rgb, target_dir, order_index)?)
}

fn remove_assets<W: AssetWriter>(writer: &W, assets: &[PathBuf]) {
    for asset in assets {
        if let Err(e) = writer.remove(asset) {
            tracing::warn!("{e}");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/batch.rs"]
mod tests;
