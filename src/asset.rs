//! Persisting rasterized layers as image files.

pub(crate) mod writer;
