//! Height-change propagation.
//!
//! When a text element grows or shrinks, everything below it shifts, every shape that visually
//! contained it grows with it, referenced clip regions and filters are kept in sync, and the
//! canvas itself is resized. Bounds for the whole tree are resolved once per cascade through
//! the [`GeometryProvider`] and reused for every containment test.

use crate::RenderOptions;
use crate::coords::{
    append_translate, fmt_number, parse_number_list, parse_translate, path_y_candidates,
    with_translate_y_shifted,
};
use crate::error::Result;
use crate::geometry::{BoundsMap, GeometryProvider};
use formo_core::{ElementBounds, ElementNode, parse_runs, runs_to_markup, serialize_document};
use std::collections::HashSet;

/// A completed text mutation whose height consequences must be propagated.
#[derive(Debug, Clone)]
pub struct HeightChange {
    pub element_id: String,
    /// Bounds of the text element before the mutation.
    pub original_bounds: ElementBounds,
    /// Rendered height delta; positive growth, negative shrink.
    pub delta: f64,
    /// Active constrained width, when the text was re-wrapped under one.
    pub constrained_width: Option<f64>,
}

/// Changed elements shorter than this match on any positive overlap; taller ones require 90%.
const SMALL_HEIGHT: f64 = 5.0;
const CONTAINMENT_RATIO: f64 = 0.9;

/// Never containment candidates.
const NON_RENDERABLE: [&str; 10] = [
    "style", "metadata", "title", "desc", "defs", "clipPath", "mask", "pattern", "marker",
    "symbol",
];

/// Recursed into for candidates, never resized themselves.
const CONTAINERS: [&str; 7] = ["g", "svg", "symbol", "marker", "switch", "a", "foreignObject"];

/// Restores visual consistency across the document after `change`.
pub async fn cascade_height_change<G: GeometryProvider>(
    tree: &mut ElementNode,
    change: &HeightChange,
    geometry: &G,
    options: &RenderOptions,
) -> Result<()> {
    if change.delta == 0.0 {
        return Ok(());
    }
    tracing::debug!(
        element_id = %change.element_id,
        delta = change.delta,
        "cascading height change"
    );

    // One geometry call per cascade, against the current serialized state; every containment
    // test below reuses this map.
    let snapshot = serialize_document(tree);
    let bounds = geometry.resolve_bounds(&snapshot).await?;

    shift_below(tree, change, true);
    structural_cascade(tree, change, &bounds, options);
    grow_root(tree, change.delta);
    Ok(())
}

/// Step 1: translate every element sitting below the changed element's pre-change top.
fn shift_below(node: &mut ElementNode, change: &HeightChange, is_root: bool) {
    if node.id == change.element_id {
        // The changed subtree was just laid out; its runs already sit at their final y.
        return;
    }

    let moved = !is_root && shift_node(node, change.original_bounds.y, change.delta);
    if moved && !node.children.is_empty() {
        // A shifted transform displaces the whole subtree at once.
        return;
    }
    for child in &mut node.children {
        shift_below(child, change, false);
    }
}

/// Applies the per-tag shift rule; returns true when the node moved via its transform.
fn shift_node(node: &mut ElementNode, threshold: f64, delta: f64) -> bool {
    match node.tag.as_str() {
        "line" => {
            let below = [node.attr_f64("y1"), node.attr_f64("y2")]
                .iter()
                .any(|y| y.is_some_and(|y| y > threshold));
            if below {
                for name in ["y1", "y2"] {
                    if let Some(y) = node.attr_f64(name) {
                        node.set_attr(name, fmt_number(y + delta));
                    }
                }
            }
            false
        }
        "circle" | "ellipse" => {
            if let Some(cy) = node.attr_f64("cy") {
                if cy > threshold {
                    node.set_attr("cy", fmt_number(cy + delta));
                }
            }
            false
        }
        "path" => shift_path(node, threshold, delta),
        _ => {
            if node.is_text {
                // Runs carry the text position; the transform rule never applies here.
                if let Some(y) = node.attr_f64("y") {
                    if y > threshold {
                        node.set_attr("y", fmt_number(y + delta));
                    }
                }
                shift_runs(node, threshold, delta);
                return false;
            }
            if let Some(y) = node.attr_f64("y") {
                if y > threshold {
                    node.set_attr("y", fmt_number(y + delta));
                }
                return false;
            }
            if let Some(transform) = node.attrs.get("transform").cloned() {
                if let Some((_, ty)) = parse_translate(&transform) {
                    if ty > threshold {
                        if let Some(updated) = with_translate_y_shifted(&transform, delta) {
                            node.set_attr("transform", updated);
                            return true;
                        }
                    }
                }
            }
            false
        }
    }
}

/// Path data is only scanned, never rewritten: when any candidate y sits below the threshold
/// the shift lands on the path's transform instead. Curve control points can be misclassified
/// as endpoints by the scan; this is a best-effort approximation.
fn shift_path(node: &mut ElementNode, threshold: f64, delta: f64) -> bool {
    if let Some(transform) = node.attrs.get("transform").cloned() {
        if let Some((_, ty)) = parse_translate(&transform) {
            if ty > threshold {
                if let Some(updated) = with_translate_y_shifted(&transform, delta) {
                    node.set_attr("transform", updated);
                    return true;
                }
            }
            return false;
        }
    }

    let below = node
        .attr("d")
        .is_some_and(|d| path_y_candidates(d).iter().any(|&y| y > threshold));
    if below {
        let transform = node.attrs.get("transform").cloned();
        node.set_attr("transform", append_translate(transform.as_deref(), 0.0, delta));
    }
    false
}

/// The same y rule, applied to each inline run independently.
fn shift_runs(node: &mut ElementNode, threshold: f64, delta: f64) {
    let Some(inner) = &node.inner_markup else {
        return;
    };
    let Ok(mut runs) = parse_runs(inner) else {
        tracing::warn!(id = %node.id, "unparsable inline runs; skipping run shift");
        return;
    };

    let mut changed = false;
    for run in &mut runs {
        if let Some(y) = run.attr_f64("y") {
            if y > threshold {
                run.set_attr("y", fmt_number(y + delta));
                changed = true;
            }
        }
    }
    if changed {
        node.inner_markup = Some(runs_to_markup(&runs));
    }
}

/// Steps 2 and 3: walk from the changed node toward the root, resizing containing shapes and
/// synchronizing referenced clip regions and filters at each level.
fn structural_cascade(
    tree: &mut ElementNode,
    change: &HeightChange,
    bounds: &BoundsMap,
    options: &RenderOptions,
) {
    let mut processed_clips: HashSet<String> = HashSet::new();
    let mut exclude = change.element_id.clone();

    loop {
        let Some(parent_id) = tree.find_parent_of(&exclude).map(|p| p.id.clone()) else {
            break;
        };

        if let Some(parent) = tree.find_mut(&parent_id) {
            for child in &mut parent.children {
                if child.id != exclude {
                    resize_contained(child, change, bounds);
                }
            }
        }
        sync_clip_refs(tree, &parent_id, change, bounds, &mut processed_clips);
        sync_filter_ref(tree, &parent_id, change, options);

        exclude = parent_id;
    }
}

/// Grows a candidate's height-equivalent dimension when its box contains the changed bounds;
/// containers are recursed into instead of resized.
fn resize_contained(node: &mut ElementNode, change: &HeightChange, bounds: &BoundsMap) {
    let tag = node.tag.as_str();
    if NON_RENDERABLE.contains(&tag) {
        return;
    }
    if CONTAINERS.contains(&tag) {
        for child in &mut node.children {
            if child.id != change.element_id {
                resize_contained(child, change, bounds);
            }
        }
        return;
    }

    // A geometry miss means this candidate is not a containment match; keep going.
    let Some(candidate) = bounds.get(&node.id) else {
        return;
    };
    if !contains(candidate, &change.original_bounds) {
        return;
    }

    match tag {
        "rect" => grow_attr(node, "height", change.delta),
        "ellipse" => grow_attr(node, "ry", change.delta),
        "circle" => grow_attr(node, "r", change.delta),
        _ => {}
    }
}

/// Vertical-overlap containment test.
fn contains(candidate: &ElementBounds, changed: &ElementBounds) -> bool {
    let overlap = candidate.vertical_overlap(changed);
    if changed.height < SMALL_HEIGHT {
        overlap > 0.0
    } else {
        overlap / changed.height >= CONTAINMENT_RATIO
    }
}

fn grow_attr(node: &mut ElementNode, name: &str, delta: f64) {
    if let Some(value) = node.attr_f64(name) {
        node.set_attr(name, fmt_number((value + delta).max(0.0)));
        tracing::trace!(id = %node.id, attr = name, delta, "resized containing shape");
    }
}

/// Clip-region rectangles referenced from the container just processed grow with the change,
/// under the same containment test.
fn sync_clip_refs(
    tree: &mut ElementNode,
    container_id: &str,
    change: &HeightChange,
    bounds: &BoundsMap,
    processed: &mut HashSet<String>,
) {
    let mut refs: Vec<String> = Vec::new();
    if let Some(container) = tree.find(container_id) {
        container.walk(&mut |n| {
            if let Some(clip_id) = n.attr("clip-path").and_then(parse_url_ref) {
                if processed.insert(clip_id.to_string()) {
                    refs.push(clip_id.to_string());
                }
            }
        });
    }

    for clip_id in refs {
        let Some(clip) = tree.find_mut(&clip_id) else {
            continue;
        };
        for child in &mut clip.children {
            if child.tag != "rect" {
                continue;
            }
            let Some(rect_bounds) = bounds.get(&child.id) else {
                continue;
            };
            if contains(rect_bounds, &change.original_bounds) {
                grow_attr(child, "height", change.delta);
            }
        }
    }
}

/// For a group whose only meaningful child is the changed text node, the referenced filter
/// grows in height; its y-position is left untouched, and its width is pinned to the
/// constrained width whenever that mode is active.
fn sync_filter_ref(
    tree: &mut ElementNode,
    container_id: &str,
    change: &HeightChange,
    options: &RenderOptions,
) {
    let Some(container) = tree.find(container_id) else {
        return;
    };
    if container.tag != "g" {
        return;
    }
    let meaningful: Vec<&ElementNode> = container
        .children
        .iter()
        .filter(|c| !NON_RENDERABLE.contains(&c.tag.as_str()))
        .collect();
    if meaningful.len() != 1 || meaningful[0].id != change.element_id {
        return;
    }
    let Some(filter_id) = container.attr("filter").and_then(parse_url_ref) else {
        return;
    };
    let filter_id = filter_id.to_string();

    let Some(filter) = tree.find_mut(&filter_id) else {
        return;
    };
    grow_attr(filter, "height", change.delta);
    if options.sync_filter_width {
        if let Some(width) = change.constrained_width {
            filter.set_attr("width", fmt_number(width));
        }
    }
}

/// Step 4: the canvas itself. An explicit height grows with the delta; a viewBox's height
/// component grows with it too. A root without a height attribute never gets one force-added.
fn grow_root(root: &mut ElementNode, delta: f64) {
    if let Some(height) = root.attr_f64("height") {
        root.set_attr("height", fmt_number((height + delta).max(0.0)));
    }
    if let Some(viewbox) = root.attrs.get("viewBox").cloned() {
        if let [x, y, w, h] = parse_number_list(&viewbox)[..] {
            root.set_attr(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    fmt_number(x),
                    fmt_number(y),
                    fmt_number(w),
                    fmt_number((h + delta).max(0.0))
                ),
            );
        }
    }
}

/// Extracts the target id from `url(#id)` (quoted or not) or a plain `#id` reference.
fn parse_url_ref(value: &str) -> Option<&str> {
    let value = value.trim();
    let inner = value
        .strip_prefix("url(")
        .and_then(|v| v.strip_suffix(')'))
        .unwrap_or(value)
        .trim()
        .trim_matches(['\'', '"']);
    inner.strip_prefix('#').filter(|id| !id.is_empty())
}
