//! Binding application.
//!
//! Text bindings run first, each completing its own cascade before the next is processed
//! (later y-coordinates depend on earlier shifts), then image bindings, then color bindings.
//! This ordering is a correctness requirement, not an optimization. Every resolution miss is
//! silently ignored so partial data never corrupts the rest of the document.

use crate::RenderOptions;
use crate::cascade::{HeightChange, cascade_height_change};
use crate::coords::fmt_number;
use crate::error::Result;
use crate::geometry::GeometryProvider;
use crate::text::layout::{LineMetrics, lines_to_runs};
use crate::text::wrap::break_text_into_lines;
use crate::text::{ASCENT_FACTOR, FontSpec, GlyphMetrics};
use formo_core::{
    Binding, ColorRoles, Component, DataSources, ElementBounds, ElementNode,
    HorizontalAlignment, RenderingStrategy, TextRun, TextWidth, parse_runs, resolve_path,
    runs_to_markup,
};
use serde_json::Value;

/// Applies every binding to the tree, driving text layout and height cascades.
pub async fn apply_bindings<G: GeometryProvider>(
    tree: &mut ElementNode,
    bindings: &[Binding],
    components: &[Component],
    data: &DataSources,
    metrics: &dyn GlyphMetrics,
    geometry: &G,
    options: &RenderOptions,
) -> Result<()> {
    for binding in bindings {
        let Some(Component::Text {
            element_id,
            rendering,
            ..
        }) = target_component(binding, components)
        else {
            continue;
        };
        let Some(text) = resolve_value(binding, data).and_then(scalar_to_string) else {
            tracing::debug!(component = %binding.target_component_id, "text binding unresolved; skipped");
            continue;
        };
        apply_text_binding(
            tree,
            element_id,
            rendering.as_ref(),
            &text,
            metrics,
            geometry,
            options,
        )
        .await?;
    }

    for binding in bindings {
        let Some(Component::Image { element_id, .. }) = target_component(binding, components)
        else {
            continue;
        };
        let Some(reference) = resolve_value(binding, data).and_then(scalar_to_string) else {
            continue;
        };
        apply_image_binding(tree, element_id, &reference);
    }

    for binding in bindings {
        let Some(Component::Color {
            color,
            roles,
            element_ids,
            ..
        }) = target_component(binding, components)
        else {
            continue;
        };
        // A color value must resolve to a string; anything else is a no-op.
        let Some(Value::String(resolved)) = resolve_value(binding, data) else {
            continue;
        };
        apply_color_binding(tree, color, *roles, element_ids.as_deref(), resolved);
    }

    Ok(())
}

fn target_component<'a>(binding: &Binding, components: &'a [Component]) -> Option<&'a Component> {
    components
        .iter()
        .find(|c| c.id() == binding.target_component_id)
}

fn resolve_value<'a>(binding: &Binding, data: &'a DataSources) -> Option<&'a Value> {
    let source = data.get(&binding.source_node_id)?;
    resolve_path(source, &binding.source_field)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

async fn apply_text_binding<G: GeometryProvider>(
    tree: &mut ElementNode,
    element_id: &str,
    rendering: Option<&RenderingStrategy>,
    text: &str,
    metrics: &dyn GlyphMetrics,
    geometry: &G,
    options: &RenderOptions,
) -> Result<()> {
    let change = {
        let Some(node) = tree.find_mut(element_id) else {
            return Ok(());
        };
        if !node.is_text {
            return Ok(());
        }
        apply_text_to_node(node, rendering, text, metrics)?
    };

    if let Some(change) = change {
        cascade_height_change(tree, &change, geometry, options).await?;
    }
    Ok(())
}

fn apply_text_to_node(
    node: &mut ElementNode,
    rendering: Option<&RenderingStrategy>,
    text: &str,
    metrics: &dyn GlyphMetrics,
) -> Result<Option<HeightChange>> {
    let runs = match &node.inner_markup {
        Some(inner) => parse_runs(inner)?,
        None => Vec::new(),
    };

    let mut font = FontSpec::from_element(node);
    if let Some(first) = runs.iter().find(|r| !r.bare) {
        font.merge(
            first.attr("font-family"),
            first.attr_f64("font-size"),
            first.attr("font-weight"),
            first.attr_f64("letter-spacing"),
        );
    }

    match rendering.map(|r| r.width).unwrap_or_default() {
        TextWidth::Natural => {
            apply_natural(node, &runs, rendering, text);
            Ok(None)
        }
        TextWidth::Constrained { max_width } => Ok(apply_constrained(
            node, &runs, rendering, text, max_width, &font, metrics,
        )),
    }
}

/// Natural strategy: the first inline run gets the new text, remaining runs are cleared, and
/// the strategy's alignment/offset land on the run position and a `text-anchor` attribute.
fn apply_natural(
    node: &mut ElementNode,
    runs: &[TextRun],
    rendering: Option<&RenderingStrategy>,
    text: &str,
) {
    let mut first = runs
        .iter()
        .find(|r| !r.bare)
        .cloned()
        .unwrap_or_else(|| {
            let mut run = TextRun::new("");
            for name in ["x", "y"] {
                if let Some(v) = node.attr(name) {
                    let v = v.to_string();
                    run.set_attr(name, v);
                }
            }
            run
        });
    first.inner = TextRun::new(text).inner;

    if let Some(strategy) = rendering {
        for (name, offset) in [("x", strategy.offset.x), ("y", strategy.offset.y)] {
            if offset != 0.0 {
                let base = first.attr_f64(name).unwrap_or(0.0);
                first.set_attr(name, fmt_number(base + offset));
            }
        }
        node.set_attr("text-anchor", anchor_value(strategy.horizontal_alignment));
    }

    node.inner_markup = Some(runs_to_markup(&[first]));
    node.text = Some(text.to_string());
}

/// Constrained strategy: re-wrap under the width limit, replace every run, and report the
/// height change for cascading. The pre-change bounds are hand-computed here; this is the one
/// place bounds may bypass the geometry provider (synchronous text fallback).
fn apply_constrained(
    node: &mut ElementNode,
    runs: &[TextRun],
    rendering: Option<&RenderingStrategy>,
    text: &str,
    max_width: f64,
    font: &FontSpec,
    metrics: &dyn GlyphMetrics,
) -> Option<HeightChange> {
    let line_metrics = LineMetrics::from_runs(node, runs, font);

    let width_before = runs
        .iter()
        .map(|r| metrics.measure(&r.plain_text(), font))
        .fold(0.0_f64, f64::max);
    let original_bounds = ElementBounds::new(
        line_metrics.anchor_x,
        line_metrics.anchor_y - font.size * ASCENT_FACTOR,
        width_before,
        (line_metrics.line_count - 1) as f64 * line_metrics.advance() + font.size,
    );

    let lines = break_text_into_lines(text, max_width, font, metrics);
    let (offset_x, offset_y) = rendering
        .map(|r| (r.offset.x, r.offset.y))
        .unwrap_or((0.0, 0.0));
    let template = runs.iter().find(|r| !r.bare);
    let new_runs = lines_to_runs(&lines, template, &line_metrics, offset_x, offset_y);

    node.inner_markup = Some(runs_to_markup(&new_runs));
    node.text = Some(lines.join("\n"));
    if let Some(strategy) = rendering {
        node.set_attr("text-anchor", anchor_value(strategy.horizontal_alignment));
    }

    let delta = line_metrics.height_delta(lines.len());
    tracing::debug!(
        id = %node.id,
        lines = lines.len(),
        delta,
        "constrained text re-wrapped"
    );
    (delta != 0.0).then(|| HeightChange {
        element_id: node.id.clone(),
        original_bounds,
        delta,
        constrained_width: Some(max_width),
    })
}

fn apply_image_binding(tree: &mut ElementNode, element_id: &str, reference: &str) {
    let Some(node) = tree.find_mut(element_id) else {
        return;
    };
    if !node.is_image {
        return;
    }
    // Primary reference plus the legacy-compatible alias.
    node.set_attr("href", reference);
    node.set_attr("xlink:href", reference);
}

/// Exact-match repaint: every enabled role attribute whose current value case-insensitively
/// equals the component's declared color takes the resolved color; everything else is left
/// untouched.
fn apply_color_binding(
    tree: &mut ElementNode,
    target_color: &str,
    roles: ColorRoles,
    allow_list: Option<&[String]>,
    resolved: &str,
) {
    tree.walk_mut(&mut |node| {
        if let Some(allow) = allow_list {
            if !allow.is_empty() && !allow.iter().any(|id| id == &node.id) {
                return;
            }
        }
        for (enabled, attr) in [
            (roles.fill, "fill"),
            (roles.stroke, "stroke"),
            (roles.stop_color, "stop-color"),
        ] {
            if !enabled {
                continue;
            }
            let matches = node
                .attr(attr)
                .is_some_and(|current| current.eq_ignore_ascii_case(target_color));
            if matches {
                node.set_attr(attr, resolved);
            }
        }
    });
}

fn anchor_value(alignment: HorizontalAlignment) -> &'static str {
    match alignment {
        HorizontalAlignment::Left => "start",
        HorizontalAlignment::Center => "middle",
        HorizontalAlignment::Right => "end",
    }
}
