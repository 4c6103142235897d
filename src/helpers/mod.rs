//! Low-level readers shared by the table sources.
pub(crate) mod encoding;
pub(crate) mod reader;
pub(crate) mod xml;
pub(crate) mod zip;
