//! Layer rasterization and color normalization.
//!
//! [`LayerNode::composite`](crate::LayerNode::composite) decodes and flattens one layer in the
//! document's color model; [`to_display_color`] turns the result into RGB plus alpha.

pub(crate) mod buffer;
pub(crate) mod color;
pub(crate) mod composite;
pub(crate) mod decode;
pub(crate) mod rasterize;
