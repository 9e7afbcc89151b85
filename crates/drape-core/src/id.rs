//! Element identifiers.
//!
//! Ids are minted per element kind as `<kind>_<n>` (`rect_0`, `text_7`)
//! from one process-wide sequence, so the front and back of a garment
//! never hand out the same id. The string is interned, so an id is a
//! 4-byte copyable key.

use crate::model::ElementKind;
use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    /// A fresh id for an element of `kind`.
    pub fn mint(kind: &ElementKind) -> Self {
        let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{}_{n}", kind_prefix(kind)))
    }

    /// Only deserialization and in-crate tests name ids directly.
    pub(crate) fn intern(s: &str) -> Self {
        ElementId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// The kind prefix this id was minted with, e.g. `"rect"`.
    pub fn kind_prefix(&self) -> &str {
        let s = self.as_str();
        s.rsplit_once('_').map_or(s, |(prefix, _)| prefix)
    }
}

fn kind_prefix(kind: &ElementKind) -> &'static str {
    match kind {
        ElementKind::Rect { .. } => "rect",
        ElementKind::Circle { .. } => "circle",
        ElementKind::Text { .. } => "text",
        ElementKind::Image { .. } => "image",
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ElementId::intern(&s))
    }
}
