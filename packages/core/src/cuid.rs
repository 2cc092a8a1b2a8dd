//! Process-unique identifiers for hooks and handlers.
//!
//! Ids only need to be opaque, stringifiable, and collision-free for the
//! lifetime of the process. A single [`CuidSource`] is shared by every
//! runtime in the process; handing out an id is a lock-free counter bump.

use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// An opaque, process-unique identifier.
///
/// Cuids identify hooks, event handlers, and client hooks across renders
/// and across the wire. They are cheap to clone and compare.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cuid(Arc<str>);

impl Cuid {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuild an id from its wire form.
    pub fn from_string(raw: impl Into<String>) -> Self {
        Cuid(raw.into().into())
    }
}

impl fmt::Display for Cuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Cuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cuid({})", self.0)
    }
}

/// A monotonic source of [`Cuid`]s.
///
/// The prefix mixes the process id and the process start time so that ids
/// from different processes never collide in logs or client caches, even
/// though uniqueness is only required within one process.
pub struct CuidSource {
    prefix: String,
    counter: AtomicU64,
}

impl CuidSource {
    fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
            .unwrap_or(0);
        Self {
            prefix: format!("c{:x}{:x}", std::process::id() as u64 & 0xffff, nanos & 0xffffff),
            counter: AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> Cuid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Cuid(format!("{}-{:x}", self.prefix, n).into())
    }
}

/// The process-global id source shared by every runtime.
pub fn cuid_source() -> &'static CuidSource {
    static SOURCE: Lazy<CuidSource> = Lazy::new(CuidSource::new);
    &SOURCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let source = cuid_source();
        let a = source.next();
        let b = source.next();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_round_trip_through_strings() {
        let id = cuid_source().next();
        assert_eq!(id, Cuid::from_string(id.to_string()));
    }
}
