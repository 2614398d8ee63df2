use view_core::engine::ScriptedEngine;
use view_core::session::{Navigation, ViewSession};
use view_core::settings::Configuration;

fn minimal_engine() -> ScriptedEngine {
    ScriptedEngine::from_json(r#"{"depth":4,"model":"cube"}"#).expect("state parses")
}

fn full_engine() -> ScriptedEngine {
    ScriptedEngine::from_json(
        r#"{
            "model":"cube","format":"cartesian","depth":4,"renderDepth":4,"dimension":3,
            "iterations":4,"seed":0,"functions":3,"preRotate":true,"postRotate":false,
            "flameColouring":false,"flameCoefficients":3,
            "radius":1,"precision":10,"exportMultiplier":2,
            "background":[0.45,0.45,0.65,1],"wireframe":[1,1,1,1],"surface":[1,1,1,0.1],
            "camera":[0,0,5],"transformation":[1,0,0,1]
        }"#,
    )
    .expect("state parses")
}

#[test]
fn startup_fragment_is_empty() {
    let session = ViewSession::start(full_engine()).expect("session starts");
    assert_eq!(session.encoded_fragment(), "{}");
}

#[test]
fn editing_depth_publishes_minimal_fragment() {
    let mut session = ViewSession::start(minimal_engine()).expect("session starts");

    let mut published = Vec::new();
    session.apply_edit("depth", "6", |fragment| published.push(fragment.to_string()));

    assert_eq!(published, [r#"{"depth":6}"#]);
    assert_eq!(session.current().number("depth"), Some(6.0));
    assert_eq!(session.current().text("model"), Some("cube"));
}

#[test]
fn navigating_to_encoded_fragment_reproduces_configuration() {
    let mut session = ViewSession::start(minimal_engine()).expect("session starts");

    let outcome = session.apply_fragment("#%7B%22depth%22%3A6%7D");

    assert_eq!(outcome, Navigation::Applied);
    let expected = Configuration::from_json(r#"{"depth":6,"model":"cube"}"#).expect("parses");
    assert_eq!(session.current(), &expected);
}

#[test]
fn edit_then_navigation_round_trips_through_the_url() {
    let mut edited = ViewSession::start(full_engine()).expect("session starts");
    let mut published = Vec::new();
    edited.apply_edit("iterations", "7", |fragment| {
        published.push(fragment.to_string())
    });
    let fragment = published.pop().expect("edit published a fragment");

    let mut navigated = ViewSession::start(full_engine()).expect("session starts");
    assert_eq!(navigated.apply_fragment(&fragment), Navigation::Applied);

    assert_eq!(navigated.current(), edited.current());
}

#[test]
fn one_module_push_per_navigation_event() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");
    let before = session.engine().calls_named("parseJSON");

    session.apply_fragment(r#"{"depth":6}"#);

    assert_eq!(session.engine().calls_named("parseJSON"), before + 1);
}

#[test]
fn publishing_does_not_feed_back_into_navigation() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");

    // The writer stands in for the browser: it records the hash write
    // that would later come back as a hashchange event.
    let mut hash = String::new();
    session.apply_edit("depth", "6", |fragment| hash = fragment.to_string());
    let after_edit = session.engine().calls_named("parseJSON");

    // Deliver the echoed event; it must apply exactly once more, not
    // cascade.
    session.apply_fragment(&hash);
    assert_eq!(session.engine().calls_named("parseJSON"), after_edit + 1);

    // And the state is already what the fragment says, so the echo is
    // a no-op in content.
    assert_eq!(session.current().number("depth"), Some(6.0));
}

#[test]
fn malformed_fragment_leaves_state_untouched() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");
    let before = session.current().clone();
    let pushes = session.engine().calls_named("parseJSON");

    assert_eq!(session.apply_fragment("#!!not-json%%"), Navigation::Ignored);
    assert_eq!(session.apply_fragment("%zz%7B"), Navigation::Ignored);

    assert_eq!(session.current(), &before);
    assert_eq!(session.engine().calls_named("parseJSON"), pushes);
}

#[test]
fn navigation_pushes_through_typed_setters() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");
    session.apply_fragment(r#"{"depth":6}"#);

    let calls = &session.engine().calls;
    assert!(calls.iter().any(|c| c == "updateModel(cartesian,cube,6,4)"));
    assert!(calls.iter().any(|c| c == "setActiveDimension(3)"));
    assert!(calls.iter().any(|c| c == "setIFSParameters(4,0,3,1,0)"));
    assert!(calls.iter().any(|c| c.starts_with("setColour(0,")));
    assert!(calls.iter().any(|c| c.starts_with("setColour(1,")));
    assert!(calls.iter().any(|c| c.starts_with("setColour(2,")));
    assert_eq!(session.engine().redraws, 1);
}

#[test]
fn camera_edit_encodes_only_the_differing_element() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");

    let mut published = Vec::new();
    session.apply_edit("camera", "[1,0,5]", |fragment| {
        published.push(fragment.to_string())
    });

    // The composite diff keeps the changed value but not its index.
    assert_eq!(published, [r#"{"camera":[1]}"#]);
}

#[test]
fn navigation_normalizes_dependent_fields() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");
    session.apply_fragment(r#"{"iterations":0,"dimension":9}"#);

    assert_eq!(session.current().number("iterations"), Some(2.0));
    assert_eq!(session.current().number("dimension"), Some(4.0));
}

#[test]
fn widget_values_follow_the_normalized_state() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");
    session.apply_fragment(r#"{"depth":6,"flameColouring":true}"#);

    let widgets = session.widget_values();
    let value_of = |key: &str| {
        widgets
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(value_of("depth"), Some("6"));
    assert_eq!(value_of("flameColouring"), Some("true"));
    assert_eq!(value_of("model"), Some("cube"));
}

#[test]
fn baseline_never_changes() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");
    let baseline = session.baseline().clone();

    session.apply_edit("depth", "6", |_| {});
    session.apply_fragment(r#"{"iterations":9}"#);

    assert_eq!(session.baseline(), &baseline);
}

#[test]
fn share_link_and_embed_derive_from_the_current_diff() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");
    session.apply_edit("depth", "6", |_| {});

    assert_eq!(
        session.share_link("https://example.org/view"),
        "https://example.org/view#%7B%22depth%22%3A6%7D"
    );
    assert!(session
        .embed_snippet("https://example.org/view")
        .starts_with("<iframe height=\"720\" width=\"1280\""));
}

#[test]
fn palette_reset_returns_to_baseline_colours() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");

    session.apply_edit("surface", "[0,0,0,0.8]", |_| {});
    assert_eq!(session.encoded_fragment(), r#"{"surface":[0,0,0,0.8]}"#);

    let mut published = Vec::new();
    session.reset_palette(|fragment| published.push(fragment.to_string()));
    assert_eq!(published, ["{}"]);
}

#[test]
fn drag_and_viewport_pass_straight_through() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");

    session.set_viewport(1280, 720);
    session.drag(10.0, -5.0, 0.0);

    let calls = &session.engine().calls;
    assert!(calls.iter().any(|c| c == "setViewportSize(1280,720)"));
    assert!(calls.iter().any(|c| c == "interpretDrag(10,-5,0)"));
    assert_eq!(session.engine().redraws, 1);
}

#[test]
fn model_catalogue_lists_models_and_formats() {
    let mut session = ViewSession::start(full_engine()).expect("session starts");
    let catalogue = session.model_catalogue().expect("catalogue parses");

    assert!(catalogue.models.contains(&"cube".to_string()));
    assert!(catalogue.models.contains(&"sierpinski-gasket".to_string()));
    assert_eq!(catalogue.formats, ["cartesian", "polar"]);
}
