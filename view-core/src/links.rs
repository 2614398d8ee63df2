//! Shareable link and embed snippet derivation.

use crate::codec;

/// Shareable URL: page origin, `#`, percent-encoded fragment.
pub fn share_link(origin: &str, fragment: &str) -> String {
    format!("{origin}#{}", codec::encode_component(fragment))
}

/// Fixed-size iframe pointing at the share link.
pub fn embed_snippet(origin: &str, fragment: &str) -> String {
    format!(
        "<iframe height=\"720\" width=\"1280\" src='{}'></iframe>",
        share_link(origin, fragment)
    )
}
