//! Tree → markup emission.

use super::ElementNode;
use std::fmt::Write as _;

/// Escapes markup-significant characters using decimal numeric character references.
///
/// Named entities are never emitted so downstream XML tokenizers without an HTML entity table
/// can always re-parse the output.
pub fn escape_markup(value: &str) -> String {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&#38;"),
            '<' => out.push_str("&#60;"),
            '>' => out.push_str("&#62;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Serializes the tree back to markup.
///
/// The node id (original or generated) is always the first attribute. Text nodes with preserved
/// inline-run markup emit that blob verbatim instead of re-serializing run structure.
pub fn serialize_document(root: &ElementNode) -> String {
    let mut out = String::new();
    write_node(&mut out, root);
    out
}

fn write_node(out: &mut String, node: &ElementNode) {
    let _ = write!(out, r#"<{} id="{}""#, node.tag, escape_markup(&node.id));
    for (k, v) in &node.attrs {
        let _ = write!(out, r#" {k}="{}""#, escape_markup(v));
    }

    let empty =
        node.children.is_empty() && node.inner_markup.is_none() && node.text.is_none();
    if empty {
        out.push_str("/>");
        return;
    }
    out.push('>');

    if let Some(inner) = &node.inner_markup {
        out.push_str(inner);
    } else if let Some(text) = &node.text {
        out.push_str(&escape_markup(text));
    }
    for child in &node.children {
        write_node(out, child);
    }

    let _ = write!(out, "</{}>", node.tag);
}

#[cfg(test)]
mod tests {
    use super::super::parse::parse_document;
    use super::*;

    #[test]
    fn escape_markup_uses_decimal_references_only() {
        assert_eq!(escape_markup(r#"a<b>&"c'"#), "a&#60;b&#62;&#38;&#34;c&#39;");
        assert_eq!(escape_markup("plain"), "plain");
    }

    #[test]
    fn id_is_always_the_first_attribute() {
        let svg = serialize_document(
            &parse_document(r#"<svg width="10" id="root" height="20"/>"#).unwrap(),
        );
        assert_eq!(svg, r#"<svg id="root" width="10" height="20"/>"#);
    }

    #[test]
    fn empty_nodes_self_close() {
        let svg = serialize_document(&parse_document("<svg><g><rect/></g></svg>").unwrap());
        assert_eq!(
            svg,
            r#"<svg id="fmo-svg-1"><g id="fmo-g-1"><rect id="fmo-rect-1"/></g></svg>"#
        );
    }

    #[test]
    fn text_nodes_emit_inner_markup_verbatim() {
        let input = r#"<svg><text id="t" x="0"><tspan x="0" y="12">A &#38; B</tspan></text></svg>"#;
        let svg = serialize_document(&parse_document(input).unwrap());
        assert_eq!(
            svg,
            r#"<svg id="fmo-svg-1"><text id="t" x="0"><tspan x="0" y="12">A &#38; B</tspan></text></svg>"#
        );
    }

    #[test]
    fn round_trip_preserves_tags_attrs_and_ids() {
        let input = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><defs><clipPath id="clip"><rect width="100" height="50"/></clipPath></defs><g clip-path="url(#clip)"><rect fill="#FF0000" height="26"/><text x="4"><tspan x="4" y="12">hi</tspan></text></g></svg>"##;
        let first = parse_document(input).unwrap();
        let serialized = serialize_document(&first);
        let second = parse_document(&serialized).unwrap();

        fn assert_same(a: &crate::dom::ElementNode, b: &crate::dom::ElementNode) {
            assert_eq!(a.tag, b.tag);
            assert_eq!(a.id, b.id);
            assert_eq!(a.attrs, b.attrs);
            assert_eq!(a.inner_markup, b.inner_markup);
            assert_eq!(a.children.len(), b.children.len());
            for (ca, cb) in a.children.iter().zip(&b.children) {
                assert_same(ca, cb);
            }
        }
        assert_same(&first, &second);
    }
}
