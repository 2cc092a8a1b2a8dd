//! # Weft ssr
//!
//! Renderer adapters over a reconciled Weft tree: JSON for the live wire
//! protocol, an HTML string for the initial page load, and the wire
//! constants both share with the browser client.

pub mod consts;
mod html;
mod json;

pub use html::{render_html, HtmlRenderer};
pub use json::{patch_json, render_json, render_update_json, JsonRenderer};
