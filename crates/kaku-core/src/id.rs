use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global interner for shape identifiers.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Stable identity of a shape on the canvas (connectors included).
///
/// Interned: 4 bytes, `Copy`, O(1) equality and hashing. Persisted as the
/// plain string so records stay readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(Spur);

impl ShapeId {
    /// Intern a string as a `ShapeId`, or return the existing one.
    pub fn intern(s: &str) -> Self {
        ShapeId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh `shape_<n>` identifier.
    pub fn generate() -> Self {
        Self::with_prefix("shape")
    }

    /// Generate a fresh identifier with a custom prefix (e.g. `arrow_3`).
    pub fn with_prefix(prefix: &str) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        loop {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{prefix}_{n}");
            // Skip names already taken by explicitly interned ids (e.g. loaded records).
            if INTERNER.get(&candidate).is_none() {
                return Self::intern(&candidate);
            }
        }
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ShapeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ShapeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ShapeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ShapeId::intern("rect_left");
        let b = ShapeId::intern("rect_left");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "rect_left");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = ShapeId::generate();
        let b = ShapeId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("shape_"));
    }

    #[test]
    fn generated_ids_skip_taken_names() {
        let _taken = ShapeId::intern("probe_0");
        let fresh = ShapeId::with_prefix("probe");
        assert_ne!(fresh.as_str(), "probe_0");
    }
}
