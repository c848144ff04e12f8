//! Built-in geometry provider: computes boxes from geometric attributes instead of rasterizing.
//!
//! Good enough for containment tests over editor-produced templates, where shapes carry
//! explicit coordinates. A browser- or skia-backed provider can replace it for pixel-accurate
//! measurement.

use super::{BoundsMap, GeometryProvider};
use crate::coords::{parse_translate, path_pair_bounds};
use crate::error::{Error, Result};
use crate::text::{ASCENT_FACTOR, EmTableGlyphMetrics, FontSpec, GlyphMetrics};
use formo_core::ElementBounds;

#[derive(Debug, Clone, Default)]
pub struct ApproxGeometry<M = EmTableGlyphMetrics> {
    metrics: M,
}

impl<M: GlyphMetrics> ApproxGeometry<M> {
    pub fn new(metrics: M) -> Self {
        Self { metrics }
    }

    /// Synchronous core of [`GeometryProvider::resolve_bounds`].
    pub fn resolve_bounds_sync(&self, svg_snapshot: &str) -> Result<BoundsMap> {
        let doc = roxmltree::Document::parse_with_options(
            svg_snapshot,
            roxmltree::ParsingOptions {
                allow_dtd: false,
                ..roxmltree::ParsingOptions::default()
            },
        )
        .map_err(|e| Error::Geometry {
            message: format!("unparsable snapshot: {e}"),
        })?;

        let mut map = BoundsMap::new();
        if let Some(root) = doc.descendants().find(|n| n.has_tag_name("svg")) {
            self.visit(root, 0.0, 0.0, true, &mut map);
        }
        Ok(map)
    }

    /// Returns the node's bounds (for parent unions) while recording every identified node.
    fn visit(
        &self,
        n: roxmltree::Node<'_, '_>,
        dx: f64,
        dy: f64,
        is_root: bool,
        map: &mut BoundsMap,
    ) -> Option<ElementBounds> {
        let (dx, dy) = match n.attribute("transform").and_then(parse_translate) {
            Some((tx, ty)) => (dx + tx, dy + ty),
            None => (dx, dy),
        };

        let own = if is_root {
            // The document root is special-cased: read its declared size, never measure.
            Some(ElementBounds::new(
                0.0,
                0.0,
                attr_f64(n, "width")
                    .or_else(|| viewbox_size(n).map(|(w, _)| w))
                    .unwrap_or(0.0),
                attr_f64(n, "height")
                    .or_else(|| viewbox_size(n).map(|(_, h)| h))
                    .unwrap_or(0.0),
            ))
        } else if n.has_tag_name("text") {
            Some(self.text_bounds(n, dx, dy, map))
        } else {
            self.shape_bounds(n, dx, dy)
        };

        let mut union = own;
        for c in n.children().filter(|c| c.is_element()) {
            let child = self.visit(c, dx, dy, false, map);
            union = match (union, child) {
                (Some(a), Some(b)) => Some(union_bounds(a, b)),
                (a, b) => a.or(b),
            };
        }

        // The root reports its declared size even when content overflows it.
        let recorded = if is_root { own } else { union };
        if let (Some(bounds), Some(id)) = (recorded, n.attribute("id")) {
            map.insert(id.to_string(), bounds);
        }
        union
    }

    fn shape_bounds(
        &self,
        n: roxmltree::Node<'_, '_>,
        dx: f64,
        dy: f64,
    ) -> Option<ElementBounds> {
        let at = |name: &str| attr_f64(n, name);
        match n.tag_name().name() {
            "rect" | "image" | "use" | "foreignObject" => Some(ElementBounds::new(
                at("x").unwrap_or(0.0) + dx,
                at("y").unwrap_or(0.0) + dy,
                at("width").unwrap_or(0.0),
                at("height").unwrap_or(0.0),
            )),
            "circle" => {
                let r = at("r").unwrap_or(0.0);
                Some(ElementBounds::new(
                    at("cx").unwrap_or(0.0) - r + dx,
                    at("cy").unwrap_or(0.0) - r + dy,
                    r * 2.0,
                    r * 2.0,
                ))
            }
            "ellipse" => {
                let rx = at("rx").unwrap_or(0.0);
                let ry = at("ry").unwrap_or(0.0);
                Some(ElementBounds::new(
                    at("cx").unwrap_or(0.0) - rx + dx,
                    at("cy").unwrap_or(0.0) - ry + dy,
                    rx * 2.0,
                    ry * 2.0,
                ))
            }
            "line" => {
                let (x1, x2) = (at("x1").unwrap_or(0.0), at("x2").unwrap_or(0.0));
                let (y1, y2) = (at("y1").unwrap_or(0.0), at("y2").unwrap_or(0.0));
                Some(ElementBounds::new(
                    x1.min(x2) + dx,
                    y1.min(y2) + dy,
                    (x2 - x1).abs(),
                    (y2 - y1).abs(),
                ))
            }
            "polyline" | "polygon" => {
                points_bounds(n.attribute("points").unwrap_or("")).map(|(x0, y0, x1, y1)| {
                    ElementBounds::new(x0 + dx, y0 + dy, x1 - x0, y1 - y0)
                })
            }
            "path" => path_pair_bounds(n.attribute("d").unwrap_or("")).map(|(x0, y0, x1, y1)| {
                ElementBounds::new(x0 + dx, y0 + dy, x1 - x0, y1 - y0)
            }),
            _ => None,
        }
    }

    fn text_bounds(
        &self,
        n: roxmltree::Node<'_, '_>,
        dx: f64,
        dy: f64,
        map: &mut BoundsMap,
    ) -> ElementBounds {
        let mut font = FontSpec::default();
        font.merge(
            n.attribute("font-family"),
            attr_f64(n, "font-size"),
            n.attribute("font-weight"),
            attr_f64(n, "letter-spacing"),
        );

        let node_x = attr_f64(n, "x").unwrap_or(0.0);
        let node_y = attr_f64(n, "y").unwrap_or(0.0);

        let mut union: Option<ElementBounds> = None;
        for run in n.children().filter(|c| c.has_tag_name("tspan")) {
            let mut run_font = font.clone();
            run_font.merge(
                run.attribute("font-family"),
                attr_f64(run, "font-size"),
                run.attribute("font-weight"),
                attr_f64(run, "letter-spacing"),
            );
            let x = attr_f64(run, "x").unwrap_or(node_x);
            let y = attr_f64(run, "y").unwrap_or(node_y);
            let text = collect_text(run);
            let bounds = ElementBounds::new(
                x + dx,
                y - run_font.size * ASCENT_FACTOR + dy,
                self.metrics.measure(&text, &run_font),
                run_font.size,
            );
            if let Some(id) = run.attribute("id") {
                map.insert(id.to_string(), bounds);
            }
            union = Some(match union {
                Some(existing) => union_bounds(existing, bounds),
                None => bounds,
            });
        }

        union.unwrap_or_else(|| {
            let text = collect_text(n);
            ElementBounds::new(
                node_x + dx,
                node_y - font.size * ASCENT_FACTOR + dy,
                self.metrics.measure(&text, &font),
                font.size,
            )
        })
    }
}

impl<M: GlyphMetrics + Sync> GeometryProvider for ApproxGeometry<M> {
    async fn resolve_bounds(&self, svg_snapshot: &str) -> Result<BoundsMap> {
        self.resolve_bounds_sync(svg_snapshot)
    }
}

fn attr_f64(n: roxmltree::Node<'_, '_>, name: &str) -> Option<f64> {
    let raw = n.attribute(name)?.trim();
    let raw = raw.strip_suffix("px").unwrap_or(raw).trim_end();
    raw.parse::<f64>().ok()
}

fn viewbox_size(n: roxmltree::Node<'_, '_>) -> Option<(f64, f64)> {
    let vb = crate::coords::parse_number_list(n.attribute("viewBox")?);
    match vb.as_slice() {
        &[_, _, w, h] => Some((w, h)),
        _ => None,
    }
}

fn points_bounds(points: &str) -> Option<(f64, f64, f64, f64)> {
    let numbers = crate::coords::parse_number_list(points);
    let mut out: Option<(f64, f64, f64, f64)> = None;
    for pair in numbers.chunks(2) {
        let &[x, y] = pair else { continue };
        out = Some(match out {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    out
}

fn union_bounds(a: ElementBounds, b: ElementBounds) -> ElementBounds {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    ElementBounds::new(x, y, a.right().max(b.right()) - x, a.bottom().max(b.bottom()) - y)
}

fn collect_text(n: roxmltree::Node<'_, '_>) -> String {
    let mut out = String::new();
    for d in n.descendants() {
        if d.is_text() {
            out.push_str(d.text().unwrap_or_default());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds_of(svg: &str, id: &str) -> Option<ElementBounds> {
        ApproxGeometry::<EmTableGlyphMetrics>::default()
            .resolve_bounds_sync(svg)
            .unwrap()
            .get(id)
            .copied()
    }

    #[test]
    fn unparsable_snapshots_surface_a_geometry_error() {
        let err = ApproxGeometry::<EmTableGlyphMetrics>::default()
            .resolve_bounds_sync("<svg><rect</svg>")
            .unwrap_err();
        assert!(matches!(err, Error::Geometry { .. }));
    }

    #[test]
    fn root_size_comes_from_attributes_not_children() {
        let svg = r#"<svg id="root" width="400" height="626"><rect id="r" x="0" y="0" width="10" height="10"/></svg>"#;
        assert_eq!(
            bounds_of(svg, "root"),
            Some(ElementBounds::new(0.0, 0.0, 400.0, 626.0))
        );
    }

    #[test]
    fn shapes_report_attribute_driven_boxes() {
        let svg = r#"<svg id="root" width="100" height="100">
            <rect id="r" x="10" y="20" width="30" height="40"/>
            <circle id="c" cx="50" cy="50" r="5"/>
            <line id="l" x1="0" y1="90" x2="10" y2="70"/>
        </svg>"#;
        assert_eq!(bounds_of(svg, "r"), Some(ElementBounds::new(10.0, 20.0, 30.0, 40.0)));
        assert_eq!(bounds_of(svg, "c"), Some(ElementBounds::new(45.0, 45.0, 10.0, 10.0)));
        assert_eq!(bounds_of(svg, "l"), Some(ElementBounds::new(0.0, 70.0, 10.0, 20.0)));
    }

    #[test]
    fn groups_union_children_and_apply_translates() {
        let svg = r#"<svg id="root" width="100" height="100">
            <g id="g" transform="translate(5,10)">
                <rect id="a" x="0" y="0" width="10" height="10"/>
                <rect id="b" x="20" y="30" width="10" height="10"/>
            </g>
        </svg>"#;
        assert_eq!(bounds_of(svg, "a"), Some(ElementBounds::new(5.0, 10.0, 10.0, 10.0)));
        assert_eq!(bounds_of(svg, "g"), Some(ElementBounds::new(5.0, 10.0, 30.0, 40.0)));
    }

    #[test]
    fn text_runs_measure_through_glyph_metrics() {
        let svg = r#"<svg id="root" width="100" height="100">
            <text id="t" font-size="10"><tspan id="s" x="4" y="20">abc</tspan><tspan x="4" y="32">d</tspan></text>
        </svg>"#;
        let t = bounds_of(svg, "t").unwrap();
        assert_eq!(t.y, 12.0);
        assert_eq!(t.height, 22.0);
        assert!(t.width > 0.0);

        let s = bounds_of(svg, "s").unwrap();
        assert_eq!(s.y, 12.0);
        assert_eq!(s.height, 10.0);
    }
}
