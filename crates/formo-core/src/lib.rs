#![forbid(unsafe_code)]

//! SVG template document model (headless).
//!
//! Design goals:
//! - deterministic, collision-free element ids for addressing nodes from data bindings
//! - format-preserving re-serialization (attribute order, inline-run markup kept verbatim)
//! - silent tolerance of partial data: a binding miss never corrupts the rest of the document

pub mod datapath;
pub mod dom;
pub mod error;
pub mod model;

pub use datapath::resolve_path;
pub use dom::{
    ElementNode, IdGenerator, TextRun, parse_document, parse_runs, runs_to_markup,
    serialize_document,
};
pub use error::{Error, Result};
pub use model::{
    Binding, ColorRoles, Component, DataSources, ElementBounds, HorizontalAlignment, Offset,
    RenderingStrategy, TextWidth,
};
