//! Addressable element tree built from template markup.
//!
//! Nodes are owned exclusively by their parent; there are no back-references. Parent lookup is
//! done by tree search when needed (O(size) per lookup, cascades are shallow in practice).

mod entities;
mod ids;
mod parse;
mod runs;
mod serialize;

pub use entities::decode_entities;
pub use ids::IdGenerator;
pub use parse::parse_document;
pub use runs::{TextRun, parse_runs, runs_to_markup};
pub use serialize::{escape_markup, serialize_document};

use indexmap::IndexMap;

/// One element of the template document.
///
/// `attrs` never contains an `id` key; the canonical id lives in [`ElementNode::id`] and is
/// serialized specially (always first). `original_id` keeps the id present in the source markup,
/// if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    pub children: Vec<ElementNode>,
    pub id: String,
    pub original_id: Option<String>,
    pub is_text: bool,
    pub is_image: bool,
    /// Raw markup of the inline runs of a text node, preserved verbatim so styling detail the
    /// generic attribute model cannot represent survives re-serialization.
    pub inner_markup: Option<String>,
    /// Plain-text projection of the inline runs (entities decoded, tags stripped).
    pub text: Option<String>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
            id: String::new(),
            original_id: None,
            is_text: false,
            is_image: false,
            inner_markup: None,
            text: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Numeric attribute accessor. Tolerates a trailing `px` suffix, which editors sometimes
    /// emit on width/height.
    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        let raw = self.attrs.get(name)?.trim();
        let raw = raw.strip_suffix("px").unwrap_or(raw).trim_end();
        raw.parse::<f64>().ok()
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.shift_remove(name)
    }

    pub fn find(&self, id: &str) -> Option<&ElementNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut ElementNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Search-based parent lookup; returns `None` for the root or an unknown id.
    pub fn find_parent_of(&self, id: &str) -> Option<&ElementNode> {
        if self.children.iter().any(|c| c.id == id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_parent_of(id))
    }

    /// Preorder visit of this node and every descendant.
    pub fn walk(&self, f: &mut impl FnMut(&ElementNode)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut ElementNode)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }
}
