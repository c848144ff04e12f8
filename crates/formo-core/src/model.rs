//! Binding and component model.
//!
//! These types mirror the JSON shapes an editor conversion layer produces, so they derive both
//! `Serialize` and `Deserialize`. A binding with no matching component, and a component with no
//! matching element, are both silently ignored by the render pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A link from a named field in a data source to a named target component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub source_node_id: String,
    /// Dot path into the source's JSON value, e.g. `user.address.city`.
    pub source_field: String,
    pub target_component_id: String,
}

/// Mapping from source id to an arbitrary JSON value; immutable input to a render call.
pub type DataSources = HashMap<String, serde_json::Value>;

/// A typed role attached to one or more template elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Component {
    #[serde(rename_all = "camelCase")]
    Text {
        id: String,
        element_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rendering: Option<RenderingStrategy>,
    },
    #[serde(rename_all = "camelCase")]
    Image { id: String, element_id: String },
    #[serde(rename_all = "camelCase")]
    Color {
        id: String,
        /// The declared target color; only attributes whose current value case-insensitively
        /// equals this are repainted.
        color: String,
        #[serde(default)]
        roles: ColorRoles,
        /// Optional allow-list of element ids. Empty or absent means "all elements".
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element_ids: Option<Vec<String>>,
    },
}

impl Component {
    pub fn id(&self) -> &str {
        match self {
            Component::Text { id, .. }
            | Component::Image { id, .. }
            | Component::Color { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorRoles {
    pub fill: bool,
    pub stroke: bool,
    pub stop_color: bool,
}

impl Default for ColorRoles {
    fn default() -> Self {
        Self {
            fill: true,
            stroke: false,
            stop_color: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderingStrategy {
    #[serde(default)]
    pub width: TextWidth,
    #[serde(default)]
    pub horizontal_alignment: HorizontalAlignment,
    #[serde(default)]
    pub offset: Offset,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum TextWidth {
    /// Unwrapped single-run replacement.
    #[default]
    Natural,
    /// Width-bounded multi-line reflow.
    #[serde(rename_all = "camelCase")]
    Constrained { max_width: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Axis-aligned bounding box in document units; produced by a geometry provider.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Length of the vertical interval shared with `other`; zero when disjoint.
    pub fn vertical_overlap(&self, other: &ElementBounds) -> f64 {
        (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn component_json_shape_is_tagged_camel_case() {
        let component: Component = serde_json::from_value(json!({
            "type": "text",
            "id": "c1",
            "elementId": "fmo-text-1",
            "rendering": {
                "width": {"mode": "constrained", "maxWidth": 240.0},
                "horizontalAlignment": "center",
                "offset": {"x": 2.0, "y": 0.0}
            }
        }))
        .unwrap();

        let Component::Text { id, element_id, rendering } = component else {
            panic!("expected a text component");
        };
        assert_eq!(id, "c1");
        assert_eq!(element_id, "fmo-text-1");
        let rendering = rendering.unwrap();
        assert_eq!(rendering.width, TextWidth::Constrained { max_width: 240.0 });
        assert_eq!(rendering.horizontal_alignment, HorizontalAlignment::Center);
    }

    #[test]
    fn color_component_defaults_to_fill_only() {
        let component: Component = serde_json::from_value(json!({
            "type": "color",
            "id": "c2",
            "color": "#FF0000"
        }))
        .unwrap();
        let Component::Color { roles, element_ids, .. } = component else {
            panic!("expected a color component");
        };
        assert!(roles.fill && !roles.stroke && !roles.stop_color);
        assert!(element_ids.is_none());
    }

    #[test]
    fn vertical_overlap_clamps_at_zero() {
        let a = ElementBounds::new(0.0, 0.0, 10.0, 20.0);
        let b = ElementBounds::new(0.0, 12.0, 10.0, 20.0);
        let c = ElementBounds::new(0.0, 40.0, 10.0, 5.0);
        assert_eq!(a.vertical_overlap(&b), 8.0);
        assert_eq!(b.vertical_overlap(&a), 8.0);
        assert_eq!(a.vertical_overlap(&c), 0.0);
    }
}
