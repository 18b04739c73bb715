//! Document references discovered on listing pages.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A document found on a dataset listing page.
///
/// Identity is the local filename: two refs with the same filename are the
/// same document no matter which listing page produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    id: String,
    dataset: u32,
    source_url: String,
    referer_url: String,
}

impl DocumentRef {
    /// Create a new document reference.
    pub fn new(
        id: impl Into<String>,
        dataset: u32,
        source_url: impl Into<String>,
        referer_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            dataset,
            source_url: source_url.into(),
            referer_url: referer_url.into(),
        }
    }

    /// Fixed-width numeric identifier, e.g. `00000010`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dataset(&self) -> u32 {
        self.dataset
    }

    /// Absolute URL of the document.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Listing page the document was found on.
    pub fn referer_url(&self) -> &str {
        &self.referer_url
    }

    /// Local filename, e.g. `EFTA00000010.pdf`.
    pub fn filename(&self) -> String {
        format!("EFTA{}.pdf", self.id)
    }

    /// Numeric value of the id, used for ordering.
    pub fn numeric_id(&self) -> u64 {
        self.id.parse().unwrap_or(u64::MAX)
    }
}

/// Per-dataset index of discovered documents, keyed by filename.
///
/// The first ref inserted under a filename wins; later ones are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIndex {
    entries: HashMap<String, DocumentRef>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a ref unless its filename is already present.
    ///
    /// Returns true if the ref was new.
    pub fn insert(&mut self, doc: DocumentRef) -> bool {
        match self.entries.entry(doc.filename()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(doc);
                true
            }
        }
    }

    pub fn get(&self, filename: &str) -> Option<&DocumentRef> {
        self.entries.get(filename)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Consume the index, returning refs ordered by numeric id.
    pub fn into_sorted(self) -> Vec<DocumentRef> {
        let mut docs: Vec<DocumentRef> = self.entries.into_values().collect();
        docs.sort_by(|a, b| {
            a.numeric_id()
                .cmp(&b.numeric_id())
                .then_with(|| a.id.cmp(&b.id))
        });
        docs
    }
}
