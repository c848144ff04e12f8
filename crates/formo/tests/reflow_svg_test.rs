use formo::{
    Binding, ColorRoles, Component, DataSources, HorizontalAlignment, Offset, RenderError,
    Renderer, RenderingStrategy, TextWidth,
};
use serde_json::json;

const CARD_TEMPLATE: &str = r##"<svg width="400" height="626" viewBox="0 0 400 626"><defs><clipPath id="cardClip"><rect id="cardClipRect" x="0" y="0" width="400" height="626"/></clipPath></defs><g id="card" clip-path="url(#cardClip)"><rect id="bg" x="0" y="0" width="400" height="626" fill="#FF0000"/><text id="headline" x="20"><tspan x="20" y="120">One</tspan></text><rect id="footer" x="0" y="580" width="400" height="30" fill="#222222"/></g></svg>"##;

fn text_binding() -> Binding {
    Binding {
        source_node_id: "feed".to_string(),
        source_field: "entry.body".to_string(),
        target_component_id: "headline-component".to_string(),
    }
}

fn constrained_component(max_width: f64) -> Component {
    Component::Text {
        id: "headline-component".to_string(),
        element_id: "headline".to_string(),
        rendering: Some(RenderingStrategy {
            width: TextWidth::Constrained { max_width },
            horizontal_alignment: HorizontalAlignment::Left,
            offset: Offset::default(),
        }),
    }
}

fn feed(body: &str) -> DataSources {
    DataSources::from([("feed".to_string(), json!({"entry": {"body": body}}))])
}

fn attr_f64(doc: &roxmltree::Document<'_>, id: &str, name: &str) -> f64 {
    doc.descendants()
        .find(|n| n.attribute("id") == Some(id))
        .and_then(|n| n.attribute(name))
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or_else(|| panic!("missing numeric `{name}` on #{id}"))
}

#[test]
fn constrained_reflow_grows_backgrounds_clips_and_canvas_by_the_same_delta() {
    let renderer = Renderer::new();
    let svg = renderer
        .render_svg_sync(
            CARD_TEMPLATE,
            &[text_binding()],
            &[constrained_component(140.0)],
            &feed("The quick brown fox jumps over the lazy dog near the quiet river bank"),
        )
        .unwrap();

    let doc = roxmltree::Document::parse(&svg).unwrap();
    let headline = doc
        .descendants()
        .find(|n| n.attribute("id") == Some("headline"))
        .unwrap();
    let line_count = headline
        .children()
        .filter(|c| c.has_tag_name("tspan"))
        .count();
    assert!(line_count > 1, "body copy should wrap: {svg}");

    // Default font size 16 and the 1.2 line-height fallback drive the delta.
    let delta = (line_count - 1) as f64 * 16.0 * 1.2;
    let root = doc.root_element();
    assert_eq!(
        root.attribute("height").unwrap().parse::<f64>().unwrap(),
        626.0 + delta
    );
    let viewbox_height = root
        .attribute("viewBox")
        .unwrap()
        .split(' ')
        .nth(3)
        .unwrap()
        .parse::<f64>()
        .unwrap();
    assert_eq!(viewbox_height, 626.0 + delta);
    assert_eq!(attr_f64(&doc, "bg", "height"), 626.0 + delta);
    assert_eq!(attr_f64(&doc, "cardClipRect", "height"), 626.0 + delta);

    // Content below the headline shifts instead of resizing.
    assert_eq!(attr_f64(&doc, "footer", "y"), 580.0 + delta);
    assert_eq!(attr_f64(&doc, "footer", "height"), 30.0);
}

#[test]
fn unresolved_bindings_render_byte_identical_to_the_unbound_render() {
    let renderer = Renderer::new();
    let misses = [
        Binding {
            source_node_id: "feed".to_string(),
            source_field: "entry.missing".to_string(),
            target_component_id: "headline-component".to_string(),
        },
        Binding {
            source_node_id: "absent-source".to_string(),
            source_field: "entry.body".to_string(),
            target_component_id: "headline-component".to_string(),
        },
        Binding {
            source_node_id: "feed".to_string(),
            source_field: "entry".to_string(), // resolves to an object, not a scalar
            target_component_id: "headline-component".to_string(),
        },
        Binding {
            source_node_id: "feed".to_string(),
            source_field: "entry.body".to_string(),
            target_component_id: "no-such-component".to_string(),
        },
    ];

    let bound = renderer
        .render_svg_sync(
            CARD_TEMPLATE,
            &misses,
            &[constrained_component(140.0)],
            &feed("irrelevant"),
        )
        .unwrap();
    let unbound = renderer
        .render_svg_sync(CARD_TEMPLATE, &[], &[constrained_component(140.0)], &feed("x"))
        .unwrap();

    assert_eq!(bound, unbound);
}

#[test]
fn rendering_twice_with_the_same_inputs_is_identical() {
    let renderer = Renderer::new();
    let bindings = [
        text_binding(),
        Binding {
            source_node_id: "feed".to_string(),
            source_field: "entry.accent".to_string(),
            target_component_id: "accent-component".to_string(),
        },
    ];
    let components = [
        constrained_component(140.0),
        Component::Color {
            id: "accent-component".to_string(),
            color: "#ff0000".to_string(),
            roles: ColorRoles::default(),
            element_ids: None,
        },
    ];
    let data = DataSources::from([(
        "feed".to_string(),
        json!({"entry": {"body": "some copy that wraps across a few lines of the card", "accent": "#00AA88"}}),
    )]);

    let first = renderer
        .render_svg_sync(CARD_TEMPLATE, &bindings, &components, &data)
        .unwrap();
    let second = renderer
        .render_svg_sync(CARD_TEMPLATE, &bindings, &components, &data)
        .unwrap();
    assert_eq!(first, second);

    // Exact-match repaint: the background matched #FF0000 case-insensitively, the footer color
    // did not and is never touched.
    assert!(first.contains(r##"fill="#00AA88""##));
    assert!(first.contains(r##"fill="#222222""##));
    assert!(!first.contains(r##"fill="#FF0000""##));
}

#[test]
fn natural_binding_sets_anchor_and_offset() {
    let renderer = Renderer::new();
    let components = [Component::Text {
        id: "headline-component".to_string(),
        element_id: "headline".to_string(),
        rendering: Some(RenderingStrategy {
            width: TextWidth::Natural,
            horizontal_alignment: HorizontalAlignment::Right,
            offset: Offset { x: 10.0, y: 0.0 },
        }),
    }];
    let svg = renderer
        .render_svg_sync(
            CARD_TEMPLATE,
            &[text_binding()],
            &components,
            &feed("Short headline"),
        )
        .unwrap();

    let doc = roxmltree::Document::parse(&svg).unwrap();
    let headline = doc
        .descendants()
        .find(|n| n.attribute("id") == Some("headline"))
        .unwrap();
    assert_eq!(headline.attribute("text-anchor"), Some("end"));
    let run = headline
        .children()
        .find(|c| c.has_tag_name("tspan"))
        .unwrap();
    assert_eq!(run.attribute("x"), Some("30"));
    assert_eq!(run.attribute("y"), Some("120"));
    assert_eq!(run.text(), Some("Short headline"));
    // Natural replacement never cascades.
    assert_eq!(doc.root_element().attribute("height"), Some("626"));
}

#[test]
fn template_errors_are_returned_not_recovered() {
    let renderer = Renderer::new();
    let err = renderer
        .render_svg_sync("<g><rect/></g>", &[], &[], &DataSources::new())
        .unwrap_err();
    assert!(matches!(err, RenderError::Parse(_)));

    let err = renderer
        .render_svg_sync("<svg><rect</svg>", &[], &[], &DataSources::new())
        .unwrap_err();
    assert!(matches!(err, RenderError::Parse(_)));
}

#[test]
fn sync_and_async_entry_points_agree() {
    let renderer = Renderer::new();
    let bindings = [text_binding()];
    let components = [constrained_component(140.0)];
    let data = feed("copy that wraps across a couple of lines");

    let sync = renderer
        .render_svg_sync(CARD_TEMPLATE, &bindings, &components, &data)
        .unwrap();
    let r#async = futures::executor::block_on(renderer.render_svg(
        CARD_TEMPLATE,
        &bindings,
        &components,
        &data,
    ))
    .unwrap();
    assert_eq!(sync, r#async);
}
