//! Template markup → [`ElementNode`] tree.
//!
//! The external tokenizer is `roxmltree`; only its element/attribute/child contract is relied
//! on. Documents without an XML prolog parse fine (fragment-style templates are the norm for
//! editor exports).

use super::ElementNode;
use super::ids::{IdGenerator, assign_ids};
use crate::error::{Error, Result};
use indexmap::IndexMap;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Parses a template into an addressable tree with stable ids.
///
/// Fails if the tokenizer reports a syntax error or if the markup contains no root `svg`
/// element. Text nodes keep the raw markup of their inline runs verbatim in
/// [`ElementNode::inner_markup`]; only non-run children are decomposed into the generic tree.
pub fn parse_document(markup: &str) -> Result<ElementNode> {
    let doc = roxmltree::Document::parse_with_options(
        markup,
        roxmltree::ParsingOptions {
            allow_dtd: false,
            ..roxmltree::ParsingOptions::default()
        },
    )?;
    let root = doc
        .descendants()
        .find(|n| n.has_tag_name("svg"))
        .ok_or(Error::MissingRoot)?;

    let mut tree = build_node(root, markup);

    let mut ids = IdGenerator::new();
    ids.seed_from_markup(markup);
    assign_ids(&mut tree, &mut ids);

    tracing::debug!(root_id = %tree.id, "parsed template document");
    Ok(tree)
}

fn build_node(n: roxmltree::Node<'_, '_>, source: &str) -> ElementNode {
    let tag = n.tag_name().name().to_string();
    let mut node = ElementNode::new(&tag);

    let mut attrs = IndexMap::new();
    for (key, value) in declared_namespace_attrs(n) {
        attrs.insert(key, value);
    }
    for a in n.attributes() {
        let key = qualified_attr_name(n, &a);
        if key == "id" {
            node.original_id = Some(a.value().to_string());
            continue;
        }
        attrs.insert(key, a.value().to_string());
    }
    node.attrs = attrs;

    node.is_image = tag == "image";

    if tag == "text" {
        node.is_text = true;
        build_text_node(&mut node, n, source);
        return node;
    }

    node.text = n
        .text()
        .map(str::to_string)
        .filter(|t| !t.trim().is_empty());

    for c in n.children().filter(|c| c.is_element()) {
        node.children.push(build_node(c, source));
    }

    node
}

/// Inline runs (`tspan` elements and bare character data) are sliced out of the source
/// verbatim; any other element child is recursed into as a generic node.
fn build_text_node(node: &mut ElementNode, n: roxmltree::Node<'_, '_>, source: &str) {
    let mut inner = String::new();
    let mut projection = String::new();

    for c in n.children() {
        if c.is_element() && c.tag_name().name() == "tspan" {
            inner.push_str(&source[c.range()]);
            collect_text(c, &mut projection);
        } else if c.is_text() {
            inner.push_str(&source[c.range()]);
            projection.push_str(c.text().unwrap_or_default());
        } else if c.is_element() {
            node.children.push(build_node(c, source));
        }
    }

    node.inner_markup = (!inner.is_empty()).then_some(inner);
    node.text = (!projection.trim().is_empty()).then_some(projection);
}

fn collect_text(n: roxmltree::Node<'_, '_>, out: &mut String) {
    for c in n.children() {
        if c.is_text() {
            out.push_str(c.text().unwrap_or_default());
        } else if c.is_element() {
            collect_text(c, out);
        }
    }
}

fn qualified_attr_name(n: roxmltree::Node<'_, '_>, a: &roxmltree::Attribute<'_, '_>) -> String {
    match a.namespace() {
        None => a.name().to_string(),
        Some(uri) => {
            let prefix = n
                .namespaces()
                .find(|ns| ns.uri() == uri)
                .and_then(|ns| ns.name());
            match prefix {
                Some(p) => format!("{p}:{}", a.name()),
                None => a.name().to_string(),
            }
        }
    }
}

/// Namespace declarations are not surfaced as attributes by the tokenizer; re-derive the ones
/// declared on this node so they survive re-serialization.
fn declared_namespace_attrs(n: roxmltree::Node<'_, '_>) -> Vec<(String, String)> {
    let parent: Vec<(Option<&str>, &str)> = n
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    let mut out = Vec::new();
    for ns in n.namespaces() {
        if ns.uri() == XML_NS || parent.contains(&(ns.name(), ns.uri())) {
            continue;
        }
        let key = match ns.name() {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        out.push((key, ns.uri().to_string()));
    }
    out
}
