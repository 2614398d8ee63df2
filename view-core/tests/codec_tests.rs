use view_core::codec::{decode, encode, encode_component};
use view_core::settings::{Configuration, Value};

fn baseline() -> Configuration {
    Configuration::from_json(
        r#"{
            "model":"cube","format":"cartesian","depth":4,"renderDepth":4,
            "iterations":4,"seed":0,"functions":3,"preRotate":true,
            "radius":1,"background":[0.45,0.45,0.65,1],
            "camera":[0,0,5],"transformation":[1,0,0,1]
        }"#,
    )
    .expect("baseline parses")
}

#[test]
fn round_trip_law_holds_for_scalar_fields() {
    let base = baseline();
    let mut current = base.clone();
    current.set("depth", Value::Number(6.0));
    current.set("model", Value::Text("klein-bagel".into()));
    current.set("preRotate", Value::Boolean(false));
    current.set("radius", Value::Number(2.5));
    current.set("background", Value::Sequence(vec![0.0, 0.0, 0.0, 1.0]));

    let fragment = encode(&current, &base);
    let decoded = decode(&fragment).expect("own encoding decodes");

    assert_eq!(base.merged_with(&decoded), current);
}

#[test]
fn re_encoding_a_merged_fragment_is_stable() {
    let base = baseline();
    let mut current = base.clone();
    current.set("depth", Value::Number(6.0));
    current.set("functions", Value::Number(5.0));

    let fragment = encode(&current, &base);
    let merged = base.merged_with(&decode(&fragment).expect("decodes"));

    assert_eq!(encode(&merged, &base), fragment);
}

#[test]
fn single_and_component_encoded_fragments_decode_alike() {
    let raw = r#"{"depth":6,"model":"sphere"}"#;
    let encoded = encode_component(raw);

    let from_raw = decode(raw).expect("raw decodes");
    let from_encoded = decode(&encoded).expect("encoded decodes");

    assert_eq!(from_raw, from_encoded);
}

#[test]
fn garbled_fragments_fail_cleanly() {
    // Trailing or broken percent escapes must neither panic nor
    // produce a partial configuration.
    for garbled in ["%", "%7", "%7B%22depth", "{\"depth\":6}%zz", "depth=6"] {
        assert!(decode(garbled).is_err(), "{garbled:?} should not decode");
    }
}

#[test]
fn multi_element_composite_diffs_are_ambiguous_by_design() {
    let base = baseline();
    let mut current = base.clone();
    // Two camera elements change; the encoding keeps the values but
    // drops their indices, so the fragment cannot say which slots they
    // came from.
    current.set("camera", Value::Sequence(vec![1.0, 0.0, 7.0]));

    let fragment = encode(&current, &base);
    assert_eq!(fragment, r#"{"camera":[1,7]}"#);

    // Merging the decoded fragment replaces the baseline list with the
    // two survivors; the original three-element pose is not
    // reconstructed.
    let merged = base.merged_with(&decode(&fragment).expect("decodes"));
    assert_eq!(merged.sequence("camera"), Some(&[1.0, 7.0][..]));
}
