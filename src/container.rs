//! Layered-document container parsing (PSD and PSB).
//!
//! [`open`] walks the file header, skips the color-mode and image-resource sections, reads the
//! layer & mask section into flat records and folds them into a [`LayerTree`]. Channel data stays
//! compressed on each node; pixels are produced later by [`LayerNode::composite`].

pub(crate) mod header;
pub(crate) mod reader;
pub(crate) mod records;
pub(crate) mod tree;

use crate::foundation::error::ParseResult;

use self::{reader::ByteReader, tree::LayerTree};

/// Parse a complete container held in memory.
///
/// Unrecognized signatures and versions fail with
/// [`ParseError::UnsupportedFormat`](crate::ParseError::UnsupportedFormat); truncated or
/// inconsistent structure fails with [`ParseError::Malformed`](crate::ParseError::Malformed).
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn open(bytes: &[u8]) -> ParseResult<LayerTree> {
    let mut r = ByteReader::new(bytes);
    let header = header::read_header(&mut r)?;
    r.section(false, "color mode data")?;
    r.section(false, "image resources")?;

    let records = records::read_layer_and_mask(&mut r, &header)?;
    let layers = tree::build_tree(records, &header)?;
    tracing::debug!(
        width = header.width,
        height = header.height,
        mode = ?header.color_mode,
        layers = layers.len(),
        "container parsed"
    );
    Ok(LayerTree { header, layers })
}

#[cfg(test)]
#[path = "../tests/unit/container/open.rs"]
mod tests;
