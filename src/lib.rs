//! psd-decompose turns layered PSD/PSB documents into one PNG per top-level layer and indexes the
//! results in SQLite.
//!
//! The pipeline is:
//!
//! - Parse a document into a [`LayerTree`] with [`open`]
//! - Flatten each top-level [`LayerNode`] with [`LayerNode::composite`]
//! - Convert to display RGB with [`to_display_color`]
//! - Write the asset through an [`AssetWriter`] and record it in a [`MetadataStore`]
//!
//! [`BatchOrchestrator`] runs these steps over a directory, one store transaction per document.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod asset;
mod container;
mod foundation;
mod pipeline;
mod raster;
mod store;

#[cfg(test)]
#[path = "../tests/support/synth.rs"]
pub(crate) mod synth;

pub use crate::foundation::core::{BBox, ColorModel};
pub use crate::foundation::error::{
    BatchError, DocumentError, ParseError, ParseResult, RasterError, RasterResult, StoreError,
    StoreResult, WriteError,
};

pub use crate::container::header::{ColorMode, FileHeader, PixelFormat, PsdVersion, SampleDepth};
pub use crate::container::open;
pub use crate::container::tree::{LayerKind, LayerNode, LayerTree, PixelData};

pub use crate::raster::buffer::RawImage;
pub use crate::raster::color::{cmyk_to_rgb, lab_to_rgb, to_display_color};

pub use crate::asset::writer::{AssetWriter, PngAssetWriter, asset_file_name};
pub use crate::store::metadata::{
    AbortPolicy, DocumentHandle, DocumentRow, LayerRow, MetadataStore, NewLayer,
};

pub use crate::pipeline::batch::{
    BatchOrchestrator, BatchReport, DecomposeOpts, DocumentOutcome, DocumentReport,
    enumerate_documents,
};
pub use crate::pipeline::observer::{
    ProgressEvent, ProgressObserver, RecordingObserver, TracingObserver,
};
