//! Turns wrapped lines back into inline runs on a text element.

use super::FontSpec;
use crate::coords::fmt_number;
use formo_core::{ElementNode, TextRun};
use indexmap::IndexMap;

/// Attributes that position a run rather than style it. Generated lines inherit styling only;
/// the first line alone keeps these verbatim.
const POSITION_ATTRS: [&str; 4] = ["x", "y", "dx", "dy"];

/// Vertical rhythm for a text element's runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub line_height: f64,
    pub line_spacing: f64,
    /// Number of pre-existing rendered lines.
    pub line_count: usize,
}

impl LineMetrics {
    /// Derives the rhythm from the element's current runs.
    ///
    /// Line height comes from the difference between the first two pre-existing runs'
    /// y-coordinates when at least two exist, else from an explicit `line-height` attribute,
    /// else from `font-size × 1.2`.
    pub fn from_runs(node: &ElementNode, runs: &[TextRun], font: &FontSpec) -> Self {
        let positioned: Vec<&TextRun> = runs.iter().filter(|r| !r.bare).collect();

        let anchor_x = positioned
            .first()
            .and_then(|r| r.attr_f64("x"))
            .or_else(|| node.attr_f64("x"))
            .unwrap_or(0.0);
        let anchor_y = positioned
            .first()
            .and_then(|r| r.attr_f64("y"))
            .or_else(|| node.attr_f64("y"))
            .unwrap_or(0.0);

        let ys: Vec<f64> = positioned.iter().filter_map(|r| r.attr_f64("y")).collect();
        let line_height = match ys.as_slice() {
            [first, second, ..] => (second - first).abs(),
            _ => node
                .attr_f64("line-height")
                .unwrap_or(font.size * 1.2),
        };
        let line_height = if line_height > 0.0 {
            line_height
        } else {
            font.size * 1.2
        };

        let line_spacing = node.attr_f64("line-spacing").unwrap_or(0.0);

        Self {
            anchor_x,
            anchor_y,
            line_height,
            line_spacing,
            line_count: positioned.len().max(1),
        }
    }

    pub fn advance(&self) -> f64 {
        self.line_height + self.line_spacing
    }

    /// Height change caused by going from the pre-existing line count to `new_count` lines.
    pub fn height_delta(&self, new_count: usize) -> f64 {
        (new_count as f64 - self.line_count as f64) * self.advance()
    }
}

/// Builds one run per wrapped line.
///
/// All lines inherit the first original run's styling attributes; the first line alone inherits
/// its position attributes verbatim. Subsequent lines sit at `anchor_y + i × advance`.
pub fn lines_to_runs(
    lines: &[String],
    template: Option<&TextRun>,
    metrics: &LineMetrics,
    offset_x: f64,
    offset_y: f64,
) -> Vec<TextRun> {
    let styling: IndexMap<String, String> = template
        .map(|t| {
            t.attrs
                .iter()
                .filter(|(k, _)| !POSITION_ATTRS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default();

    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let mut run = TextRun::new(line);
        if i == 0 {
            if let Some(template) = template {
                run.attrs = template.attrs.clone();
            }
            shift_numeric_attr(&mut run, "x", metrics.anchor_x, offset_x);
            shift_numeric_attr(&mut run, "y", metrics.anchor_y, offset_y);
        } else {
            run.attrs = styling.clone();
            run.set_attr("x", fmt_number(metrics.anchor_x + offset_x));
            run.set_attr(
                "y",
                fmt_number(metrics.anchor_y + offset_y + i as f64 * metrics.advance()),
            );
        }
        out.push(run);
    }
    out
}

fn shift_numeric_attr(run: &mut TextRun, name: &str, fallback: f64, offset: f64) {
    let base = run.attr_f64(name).unwrap_or(fallback);
    run.set_attr(name, fmt_number(base + offset));
}

#[cfg(test)]
mod tests {
    use super::*;
    use formo_core::parse_runs;

    fn text_node() -> ElementNode {
        let mut node = ElementNode::new("text");
        node.is_text = true;
        node
    }

    #[test]
    fn line_height_prefers_existing_run_rhythm() {
        let runs = parse_runs(
            r##"<tspan x="10" y="50" fill="#333">a</tspan><tspan x="10" y="68">b</tspan>"##,
        )
        .unwrap();
        let m = LineMetrics::from_runs(&text_node(), &runs, &FontSpec::default());
        assert_eq!(m.line_height, 18.0);
        assert_eq!(m.anchor_x, 10.0);
        assert_eq!(m.anchor_y, 50.0);
        assert_eq!(m.line_count, 2);
    }

    #[test]
    fn line_height_falls_back_to_attr_then_font_size() {
        let runs = parse_runs(r#"<tspan x="0" y="12">a</tspan>"#).unwrap();
        let mut node = text_node();
        node.set_attr("line-height", "21");
        let m = LineMetrics::from_runs(&node, &runs, &FontSpec::default());
        assert_eq!(m.line_height, 21.0);

        let node = text_node();
        let m = LineMetrics::from_runs(&node, &runs, &FontSpec::default());
        assert_eq!(m.line_height, 16.0 * 1.2);
    }

    #[test]
    fn generated_runs_inherit_styling_but_not_position() {
        let runs = parse_runs(
            r##"<tspan x="10" y="50" dy="2" fill="#333" font-weight="bold">old</tspan>"##,
        )
        .unwrap();
        let node = text_node();
        let m = LineMetrics::from_runs(&node, &runs, &FontSpec::default());
        let lines = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let out = lines_to_runs(&lines, runs.first(), &m, 0.0, 0.0);

        assert_eq!(out.len(), 3);
        // First line keeps position attributes verbatim.
        assert_eq!(out[0].attr("dy"), Some("2"));
        assert_eq!(out[0].attr("x"), Some("10"));
        assert_eq!(out[0].attr("y"), Some("50"));
        assert_eq!(out[0].attr("fill"), Some("#333"));
        // Later lines carry styling plus computed positions only.
        assert_eq!(out[1].attr("dy"), None);
        assert_eq!(out[1].attr("fill"), Some("#333"));
        assert_eq!(out[1].attr("font-weight"), Some("bold"));
        assert_eq!(out[1].attr_f64("y"), Some(50.0 + 19.2));
        assert_eq!(out[2].attr_f64("y"), Some(50.0 + 2.0 * 19.2));
    }

    #[test]
    fn height_delta_scales_with_line_count_change() {
        let m = LineMetrics {
            anchor_x: 0.0,
            anchor_y: 0.0,
            line_height: 20.0,
            line_spacing: 4.0,
            line_count: 1,
        };
        assert_eq!(m.height_delta(4), 72.0);
        assert_eq!(m.height_delta(1), 0.0);
    }
}
