//! State runtime for Hyperview
//!
//! This crate centralises the protocol that keeps the three
//! representations of the visualizer's configuration consistent:
//!
//! 1. **Settings** – the ordered configuration store plus the declared
//!    parameter schema. The rendering module is the source of truth;
//!    the store caches its last reported state next to the immutable
//!    baseline snapshot taken at startup.
//! 2. **Codec** – diff-only encoding of a configuration against the
//!    baseline for the URL fragment, and the tolerant decoder that
//!    accepts raw, single- and double-percent-encoded forms.
//! 3. **Session** – the reconciler. Navigation events merge a decoded
//!    fragment onto the baseline and push it through the module
//!    boundary; local edits push one field and re-encode the canonical
//!    state into the URL under the reentrancy flag.
//!
//! The module boundary is a trait with one method per exported entry
//! point of the compiled renderer, so the whole protocol runs against
//! a scripted stand-in in tests. The `wasm` feature adds JavaScript
//! bindings for the pure protocol functions; the browser wiring lives
//! in the `wasm-view` crate.

pub mod codec;
pub mod engine;
pub mod input;
pub mod links;
pub mod schema;
pub mod session;
pub mod settings;

#[cfg(feature = "wasm")]
pub mod wasm_bindings;
