//! SQLite metadata for decomposed documents and their layer assets.

pub(crate) mod metadata;
