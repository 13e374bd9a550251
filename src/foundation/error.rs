use std::path::PathBuf;

use crate::foundation::core::ColorModel;

/// Result type returned by the container parser.
pub type ParseResult<T> = Result<T, ParseError>;
/// Result type returned by layer rasterization.
pub type RasterResult<T> = Result<T, RasterError>;
/// Result type returned by the metadata store.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures while reading the container structure.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// Signature, version, color mode, or bit depth this crate does not handle.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Truncated or internally inconsistent structure.
    #[error("malformed container: {0}")]
    Malformed(String),
}

impl ParseError {
    /// Build a [`ParseError::UnsupportedFormat`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Build a [`ParseError::Malformed`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Failures while turning a parsed layer into pixels.
#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    /// Channel data that cannot be decoded into the declared geometry.
    #[error("corrupt layer data: {0}")]
    CorruptData(String),

    /// Channel compression code outside the known set.
    #[error("unsupported channel compression: {0}")]
    UnsupportedCompression(u16),
}

impl RasterError {
    /// Build a [`RasterError::CorruptData`] value.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptData(msg.into())
    }
}

/// Failures while persisting a rasterized layer to disk.
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// The target directory could not be created.
    #[error("write error: create dir '{}': {source}", path.display())]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The image could not be encoded or written.
    #[error("write error: encode '{}': {source}", path.display())]
    Encode {
        /// Asset path that was being written.
        path: PathBuf,
        /// Underlying encoder failure.
        source: image::ImageError,
    },

    /// A previously written asset could not be removed.
    #[error("write error: remove '{}': {source}", path.display())]
    Remove {
        /// Asset path that was being removed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The raster was handed over before color normalization.
    #[error("write error: expected rgb raster, got {0:?}")]
    ColorModel(ColorModel),
}

/// Failures raised by the metadata store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The document stem or source path is already recorded.
    #[error("duplicate document: stem '{stem}' or path '{source_path}' already recorded")]
    DuplicateDocument {
        /// Document stem that collided.
        stem: String,
        /// Document path that collided.
        source_path: String,
    },

    /// The underlying storage engine failed.
    #[error("store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// `true` when the failure leaves the store unusable for the rest of the batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Sqlite(_))
    }
}

/// Any failure that ends processing of a single document.
#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    /// The document file could not be read.
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),

    /// The container could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A layer could not be rasterized.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// A layer asset could not be written.
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Failures that stop the whole batch.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    /// The input location could not be turned into a glob pattern.
    #[error("input pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    /// The metadata store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
