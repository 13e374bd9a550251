//! Batch decomposition of a directory of documents.
//!
//! The [`BatchOrchestrator`](crate::BatchOrchestrator) walks each document through parse,
//! rasterize, color normalization, asset write and metadata record, with one store transaction per
//! document. Progress goes to a [`ProgressObserver`](crate::ProgressObserver).

pub(crate) mod batch;
pub(crate) mod observer;
