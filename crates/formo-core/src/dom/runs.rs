//! Inline-run access for text nodes.
//!
//! A text node's inline content is stored as a verbatim markup blob. The layout and cascade
//! steps need structured access to the runs (attributes, y positions); this module converts
//! between the blob and a run list without losing nested styling inside a run.

use super::entities::decode_entities;
use super::serialize::escape_markup;
use crate::error::Result;
use indexmap::IndexMap;
use std::fmt::Write as _;

/// One inline run of a text node: a `tspan` element, or bare character data between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub attrs: IndexMap<String, String>,
    /// Raw inner markup of the run, kept verbatim (still escaped, may contain nested spans).
    pub inner: String,
    /// True for character data that sat directly inside the text element, outside any `tspan`.
    pub bare: bool,
}

impl TextRun {
    /// A fresh run wrapping plain text.
    pub fn new(text: &str) -> Self {
        Self {
            attrs: IndexMap::new(),
            inner: escape_markup(text),
            bare: false,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attrs.get(name)?.trim().parse::<f64>().ok()
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Entity-decoded, tag-stripped projection of the run content.
    pub fn plain_text(&self) -> String {
        let mut flat = String::with_capacity(self.inner.len());
        let mut in_tag = false;
        for ch in self.inner.chars() {
            match ch {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => flat.push(ch),
                _ => {}
            }
        }
        decode_entities(&flat)
    }
}

/// Splits an inner-markup blob into its runs.
pub fn parse_runs(inner_markup: &str) -> Result<Vec<TextRun>> {
    if inner_markup.is_empty() {
        return Ok(Vec::new());
    }

    let wrapped = format!("<text>{inner_markup}</text>");
    let doc = roxmltree::Document::parse_with_options(
        &wrapped,
        roxmltree::ParsingOptions {
            allow_dtd: false,
            ..roxmltree::ParsingOptions::default()
        },
    )?;
    let root = doc.root_element();

    let mut runs = Vec::new();
    for c in root.children() {
        if c.is_element() && c.tag_name().name() == "tspan" {
            let mut attrs = IndexMap::new();
            for a in c.attributes() {
                attrs.insert(a.name().to_string(), a.value().to_string());
            }
            let inner = match (c.first_child(), c.last_child()) {
                (Some(first), Some(last)) => {
                    wrapped[first.range().start..last.range().end].to_string()
                }
                _ => String::new(),
            };
            runs.push(TextRun {
                attrs,
                inner,
                bare: false,
            });
        } else if c.is_text() {
            runs.push(TextRun {
                attrs: IndexMap::new(),
                inner: wrapped[c.range()].to_string(),
                bare: true,
            });
        }
    }
    Ok(runs)
}

/// Re-emits runs as an inner-markup blob.
pub fn runs_to_markup(runs: &[TextRun]) -> String {
    let mut out = String::new();
    for run in runs {
        if run.bare {
            out.push_str(&run.inner);
            continue;
        }
        out.push_str("<tspan");
        for (k, v) in &run.attrs {
            let _ = write!(&mut out, r#" {k}="{}""#, escape_markup(v));
        }
        if run.inner.is_empty() {
            out.push_str("/>");
        } else {
            let _ = write!(&mut out, ">{}</tspan>", run.inner);
        }
    }
    out
}
