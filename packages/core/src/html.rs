//! Named constructors for common HTML elements and attributes.
//!
//! Thin sugar over [`el`](crate::nodes::el) and
//! [`attr`](crate::nodes::attr) so view code reads as markup:
//!
//! ```rust,ignore
//! div(vec![class("page")], vec![
//!     h1(vec![], vec![text("Inbox")]),
//!     a(vec![href("#"), on("click", handler)], vec![text("Refresh")]),
//! ])
//! ```

use crate::nodes::{attr, el, Attribute, Element};

macro_rules! declare_elements {
    ($($name:ident)*) => {
        $(
            pub fn $name(attributes: Vec<Attribute>, children: Vec<Element>) -> Element {
                el(stringify!($name), attributes, children)
            }
        )*
    };
}

macro_rules! declare_void_elements {
    ($($name:ident)*) => {
        $(
            pub fn $name(attributes: Vec<Attribute>) -> Element {
                el(stringify!($name), attributes, Vec::new())
            }
        )*
    };
}

declare_elements!(
    a abbr article aside blockquote body button code details dialog div em
    fieldset figure footer form h1 h2 h3 h4 h5 h6 head header html i label
    legend li main nav ol option p pre section select small span strong
    summary table tbody td textarea th thead title tr ul
);

declare_void_elements!(br hr img input link meta);

pub fn class(value: impl Into<String>) -> Attribute {
    attr("class", value)
}

pub fn href(value: impl Into<String>) -> Attribute {
    attr("href", value)
}

pub fn id_attr(value: impl Into<String>) -> Attribute {
    attr("id", value)
}

pub fn input_type(value: impl Into<String>) -> Attribute {
    attr("type", value)
}

pub fn name(value: impl Into<String>) -> Attribute {
    attr("name", value)
}

pub fn placeholder(value: impl Into<String>) -> Attribute {
    attr("placeholder", value)
}

pub fn value(value: impl Into<String>) -> Attribute {
    attr("value", value)
}
