//! Wire attribute names shared with the browser client.
//!
//! These strings are part of the protocol: the client discovers event
//! bindings, client hooks, and keys in rendered output by exactly these
//! names. Changing any of them is a wire version bump.

/// Prefix for event handler attributes; a click handler renders as
/// `weft-event-click`.
pub const EVENT_ATTR_PREFIX: &str = "weft-event";

/// Attribute naming the client hook bound to an element.
pub const CLIENT_HOOK_ATTR: &str = "weft-hook";

/// Attribute carrying the client hook's id.
pub const CLIENT_HOOK_ID_ATTR: &str = "weft-hook-id";

/// Attribute carrying a node's reconciliation key.
pub const KEY_ATTR: &str = "weft-key";
