use crate::{
    container::header::{FileHeader, PixelFormat},
    container::records::{ChannelData, Divider, LayerRecord, MaskInfo},
    foundation::core::BBox,
    foundation::error::{ParseError, ParseResult},
};

/// Parsed document: header plus its top-level layers in bottom-to-top order.
#[derive(Clone, Debug)]
pub struct LayerTree {
    /// File header.
    pub header: FileHeader,
    /// Top-level layers, bottom-most first. Index in this list is the layer's order index.
    pub layers: Vec<LayerNode>,
}

impl LayerTree {
    /// Number of top-level layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Return `true` when the document has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// One parsed, not yet rasterized layer.
#[derive(Clone, Debug)]
pub struct LayerNode {
    /// Layer name; may be empty and is not unique.
    pub name: String,
    /// Bounding box in document pixel coordinates.
    pub bbox: BBox,
    /// Layer opacity, 255 = opaque.
    pub opacity: u8,
    /// Visibility flag as stored in the document.
    pub visible: bool,
    /// Clipped to the layer below it.
    pub clipping: bool,
    /// Four-character blend mode key (e.g. `norm`, `mul `).
    pub blend_key: String,
    /// Content variant.
    pub kind: LayerKind,
    pub(crate) format: PixelFormat,
    pub(crate) mask: Option<LayerMask>,
}

/// Content variant of a [`LayerNode`].
#[derive(Clone, Debug)]
pub enum LayerKind {
    /// Plain pixel layer (also type and smart-object layers, which carry rendered pixels).
    Raster(PixelData),
    /// Layer group; children bottom-most first.
    Group(Vec<LayerNode>),
    /// Adjustment or fill layer, identified by its tagged-block key.
    Adjustment {
        /// Tagged-block key, e.g. `levl` or `SoCo`.
        key: String,
        /// Any pixel data the layer carries.
        pixels: PixelData,
    },
    /// Record this crate does not know how to render; composites as transparent.
    Unknown,
}

impl LayerKind {
    /// Stable lowercase tag for persistence and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Raster(_) => "raster",
            Self::Group(_) => "group",
            Self::Adjustment { .. } => "adjustment",
            Self::Unknown => "unknown",
        }
    }
}

/// Opaque handle over a layer's still-compressed channel data.
#[derive(Clone, Debug, Default)]
pub struct PixelData {
    pub(crate) channels: Vec<ChannelData>,
}

impl PixelData {
    pub(crate) fn channel(&self, id: i16) -> Option<&ChannelData> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub(crate) fn has_color(&self) -> bool {
        self.channels.iter().any(|c| c.id >= 0)
    }
}

/// User mask attached to a layer.
#[derive(Clone, Debug)]
pub(crate) struct LayerMask {
    pub(crate) info: MaskInfo,
    pub(crate) channel: ChannelData,
}

/// Fold bottom-to-top layer records into a tree of nodes.
///
/// Groups are bracketed by a `GroupEnd` divider (which appears first in file order) and closed by
/// the group's own record carrying an open/closed folder divider.
pub(crate) fn build_tree(records: Vec<LayerRecord>, header: &FileHeader) -> ParseResult<Vec<LayerNode>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let format = header.pixel_format()?;

    let mut stack: Vec<Vec<LayerNode>> = vec![Vec::new()];
    for record in records {
        match record.divider {
            Some(Divider::GroupEnd) => stack.push(Vec::new()),
            Some(Divider::OpenGroup | Divider::ClosedGroup) => {
                if stack.len() < 2 {
                    return Err(ParseError::malformed(format!(
                        "group '{}' closes without an opening divider",
                        record.name
                    )));
                }
                let children = stack.pop().unwrap_or_default();
                let node = group_node(record, children, format);
                push_node(&mut stack, node);
            }
            Some(Divider::Other(code)) => {
                tracing::debug!(code, name = %record.name, "unknown section divider");
                let node = leaf_node(record, format, true);
                push_node(&mut stack, node);
            }
            Some(Divider::Layer) | None => {
                let node = leaf_node(record, format, false);
                push_node(&mut stack, node);
            }
        }
    }

    if stack.len() != 1 {
        return Err(ParseError::malformed(format!(
            "{} layer group(s) never closed",
            stack.len() - 1
        )));
    }
    Ok(stack.pop().unwrap_or_default())
}

fn push_node(stack: &mut [Vec<LayerNode>], node: LayerNode) {
    if let Some(top) = stack.last_mut() {
        top.push(node);
    }
}

fn split_mask(record: &mut LayerRecord) -> Option<LayerMask> {
    let info = record.mask?;
    let pos = record.channels.iter().position(|c| c.id == -2)?;
    let channel = record.channels.remove(pos);
    Some(LayerMask { info, channel })
}

fn group_node(mut record: LayerRecord, children: Vec<LayerNode>, format: PixelFormat) -> LayerNode {
    let bbox = children
        .iter()
        .filter(|c| c.visible)
        .fold(BBox::EMPTY, |acc, c| acc.union(c.bbox));
    let mask = split_mask(&mut record);
    LayerNode {
        name: record.name,
        bbox,
        opacity: record.opacity,
        visible: !record.hidden,
        clipping: record.clipping,
        blend_key: String::from_utf8_lossy(&record.blend_key).into_owned(),
        kind: LayerKind::Group(children),
        format,
        mask,
    }
}

fn leaf_node(mut record: LayerRecord, format: PixelFormat, unknown_divider: bool) -> LayerNode {
    let mask = split_mask(&mut record);
    let pixels = PixelData {
        channels: std::mem::take(&mut record.channels),
    };
    let kind = if unknown_divider {
        LayerKind::Unknown
    } else if let Some(key) = record.adjustment {
        LayerKind::Adjustment {
            key: String::from_utf8_lossy(&key).into_owned(),
            pixels,
        }
    } else if pixels.has_color() {
        LayerKind::Raster(pixels)
    } else {
        LayerKind::Unknown
    };
    LayerNode {
        name: record.name,
        bbox: record.rect,
        opacity: record.opacity,
        visible: !record.hidden,
        clipping: record.clipping,
        blend_key: String::from_utf8_lossy(&record.blend_key).into_owned(),
        kind,
        format,
        mask,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/container/tree.rs"]
mod tests;
