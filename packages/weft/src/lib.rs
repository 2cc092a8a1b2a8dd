//! # Weft
//!
//! Build server-driven UIs in Rust: components are plain functions, state
//! lives in hooks, and a per-connection runtime pushes full trees or
//! minimal patches to the browser over a transport of your choosing.
//!
//! This crate re-exports the core runtime and the renderer adapters; most
//! applications only need the [`prelude`].

pub use weft_core;
pub use weft_ssr;

pub mod prelude {
    pub use weft_core::prelude::*;
    pub use weft_ssr::{render_html, render_json, render_update_json};
}
