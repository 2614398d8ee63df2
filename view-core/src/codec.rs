//! URL fragment codec.
//!
//! Encodes a configuration as a diff against the baseline so the
//! fragment stays minimal and human-diffable: keys that equal the
//! baseline are omitted entirely, and the two composite fields diff
//! element-wise. Decoding accepts raw JSON plus the single- and
//! double-percent-encoded forms older links carry.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

use crate::schema;
use crate::settings::{Configuration, Value};

// The characters encodeURIComponent leaves intact.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("fragment is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("fragment is not valid UTF-8 after percent-decoding")]
    Encoding,
}

/// Diff-encode `current` against `baseline`.
///
/// Scalar keys equal to the baseline are omitted; `camera` and
/// `transformation` emit only the elements that differ from the
/// baseline element at the same index, in original order. The element
/// diff keeps the values but not their positions, so two states whose
/// differing elements happen to share values encode identically.
pub fn encode(current: &Configuration, baseline: &Configuration) -> String {
    let mut diff = Configuration::new();

    for (key, value) in current.iter() {
        let base = baseline.get(key);
        if base == Some(value) {
            continue;
        }
        if schema::is_composite(key) {
            if let Some(survivors) = sequence_diff(value, base) {
                diff.set(key, Value::Sequence(survivors));
                continue;
            }
        }
        diff.set(key, value.clone());
    }

    diff.to_json()
}

fn sequence_diff(value: &Value, base: Option<&Value>) -> Option<Vec<f64>> {
    let current = value.as_sequence()?;
    let base = base.and_then(Value::as_sequence);

    Some(
        current
            .iter()
            .enumerate()
            .filter(|(index, element)| match base.and_then(|b| b.get(*index)) {
                Some(b) => b != *element,
                None => true,
            })
            .map(|(_, element)| *element)
            .collect(),
    )
}

/// Decode a fragment into a partial configuration.
///
/// A leading `#` is tolerated. The raw text is parsed first; if that
/// fails the fragment is percent-decoded once and parsed again, which
/// covers both encoded links and double-encoded links the browser has
/// already unescaped one level of. Errors are recoverable: callers log
/// and leave the current state untouched.
pub fn decode(fragment: &str) -> Result<Configuration, CodecError> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);

    match serde_json::from_str(fragment) {
        Ok(config) => Ok(config),
        Err(_) => {
            let decoded = percent_decode_str(fragment)
                .decode_utf8()
                .map_err(|_| CodecError::Encoding)?;
            serde_json::from_str(&decoded).map_err(CodecError::Json)
        }
    }
}

/// Percent-encode a fragment for embedding in a shareable URL.
pub fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> Configuration {
        Configuration::from_json(
            r#"{"depth":4,"model":"cube","camera":[0,0,5],"surface":[1,1,1,0.1]}"#,
        )
        .expect("baseline parses")
    }

    #[test]
    fn identical_configurations_encode_empty() {
        let base = baseline();
        assert_eq!(encode(&base, &base), "{}");
    }

    #[test]
    fn scalar_diff_is_minimal() {
        let base = baseline();
        let mut current = base.clone();
        current.set("depth", Value::Number(6.0));
        assert_eq!(encode(&current, &base), r#"{"depth":6}"#);
    }

    #[test]
    fn colour_diff_is_all_or_nothing() {
        let base = baseline();
        let mut current = base.clone();
        current.set("surface", Value::Sequence(vec![1.0, 1.0, 1.0, 0.4]));
        assert_eq!(encode(&current, &base), r#"{"surface":[1,1,1,0.4]}"#);
    }

    #[test]
    fn composite_diff_drops_positions() {
        let base = baseline();
        let mut current = base.clone();
        current.set("camera", Value::Sequence(vec![1.0, 0.0, 5.0]));
        // Only the differing element survives; its index does not.
        assert_eq!(encode(&current, &base), r#"{"camera":[1]}"#);
    }

    #[test]
    fn composite_diff_with_extra_elements() {
        let base = baseline();
        let mut current = base.clone();
        current.set("camera", Value::Sequence(vec![0.0, 0.0, 5.0, 2.0]));
        assert_eq!(encode(&current, &base), r#"{"camera":[2]}"#);
    }

    #[test]
    fn decode_accepts_raw_json() {
        let config = decode(r#"{"depth":6}"#).expect("raw json decodes");
        assert_eq!(config.number("depth"), Some(6.0));
    }

    #[test]
    fn decode_accepts_percent_encoded() {
        let config = decode("%7B%22depth%22%3A6%7D").expect("encoded form decodes");
        assert_eq!(config.number("depth"), Some(6.0));
    }

    #[test]
    fn decode_strips_leading_hash() {
        let config = decode("#%7B%22depth%22%3A6%7D").expect("hash prefix decodes");
        assert_eq!(config.number("depth"), Some(6.0));
    }

    #[test]
    fn decode_rejects_garbage_without_panicking() {
        assert!(decode("not json at all").is_err());
        assert!(decode("%zz%7B").is_err());
        assert!(decode("").is_err());
    }

    #[test]
    fn encode_decode_merge_round_trips_scalars() {
        let base = baseline();
        let mut current = base.clone();
        current.set("depth", Value::Number(6.0));
        current.set("model", Value::Text("sphere".into()));

        let decoded = decode(&encode(&current, &base)).expect("own output decodes");
        assert_eq!(base.merged_with(&decoded), current);
    }

    #[test]
    fn component_encoding_matches_encode_uri_component() {
        assert_eq!(encode_component(r#"{"depth":6}"#), "%7B%22depth%22%3A6%7D");
        assert_eq!(encode_component("a-b_c.d~e"), "a-b_c.d~e");
    }
}
