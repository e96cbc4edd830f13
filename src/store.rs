//! Holds the raw dataset. Replaced wholesale on every successful load or import.

use crate::record::RecordCollection;

/// Where the current collection came from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Origin {
    Default(String),
    Import(Option<String>),
}

#[derive(Debug, Default)]
pub struct RecordStore {
    current: Option<(RecordCollection, Origin)>,
    // bumped on every replace; lets consumers memoize on (generation, range)
    generation: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new collection. The previous one is dropped, never merged.
    pub fn replace(&mut self, collection: RecordCollection, origin: Origin) {
        self.current = Some((collection, origin));
        self.generation = self.generation.wrapping_add(1);
    }

    /// Read-only snapshot; empty when nothing was loaded yet.
    pub fn snapshot(&self) -> RecordCollection {
        self.current
            .as_ref()
            .map(|(c, _)| c.clone())
            .unwrap_or_default()
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.current.as_ref().map(|(_, o)| o)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
