//! Stashing of unmapped provider fields under the provider's extension namespace, and
//! recovering them when writing the provider shape back out.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::model::{Document, ExtensionValue, Extensions};

const WORD_SEGMENTS: &str = "word_segments";

/// Collects unmapped fields while converting to canonical form.
pub struct ExtensionWriter {
    provider: &'static str,
    entries: BTreeMap<String, ExtensionValue>,
}

impl ExtensionWriter {
    pub fn new(provider: &'static str) -> Self {
        Self {
            provider,
            entries: BTreeMap::new(),
        }
    }

    /// Store a map of extra fields, skipped when empty.
    pub fn object(&mut self, key: &str, extra: Map<String, Value>) {
        if !extra.is_empty() {
            self.entries
                .insert(key.to_string(), ExtensionValue::from(Value::Object(extra)));
        }
    }

    /// Store per-item extras aligned by index, skipped when every item is empty.
    pub fn list(&mut self, key: &str, items: Vec<Map<String, Value>>) {
        if items.iter().any(|m| !m.is_empty()) {
            let list = items.into_iter().map(Value::Object).collect();
            self.entries
                .insert(key.to_string(), ExtensionValue::from(Value::Array(list)));
        }
    }

    /// Store a value verbatim.
    pub fn value(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), ExtensionValue::from(value));
    }

    /// Record the segment each word was nested under, when segment containment alone would
    /// place the words differently. `doc` holds the converted segments and words.
    pub fn placement(&mut self, doc: &Document, actual: &[Option<usize>]) {
        if doc.words_by_segment().placement(doc.words.len()) != actual {
            self.value(WORD_SEGMENTS, json!(actual));
        }
    }

    pub fn finish(self) -> Extensions {
        let mut extensions = Extensions::new();
        if !self.entries.is_empty() {
            extensions.insert(self.provider.to_string(), ExtensionValue::Map(self.entries));
        }
        extensions
    }
}

/// Read access to a provider's stash on an existing document.
pub struct ExtensionReader {
    entries: Map<String, Value>,
}

impl ExtensionReader {
    pub fn new(doc: &Document, provider: &str) -> Self {
        let entries = match doc.extension(provider).map(Value::from) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self { entries }
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Stashed map under `key`, empty when absent.
    pub fn object(&self, key: &str) -> Map<String, Value> {
        match self.entries.get(key) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    /// Stashed extras for item `index` of the list under `key`, empty when absent.
    pub fn list_item(&self, key: &str, index: usize) -> Map<String, Value> {
        match self.entries.get(key).and_then(|v| v.get(index)) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    /// Segment each word belongs under: the stashed placement when it still fits the
    /// document, otherwise derived from containment.
    pub fn placement(&self, doc: &Document) -> Vec<Option<usize>> {
        self.entries
            .get(WORD_SEGMENTS)
            .and_then(|v| serde_json::from_value::<Vec<Option<usize>>>(v.clone()).ok())
            .filter(|p| {
                p.len() == doc.words.len() && p.iter().flatten().all(|&s| s < doc.segments.len())
            })
            .unwrap_or_else(|| doc.words_by_segment().placement(doc.words.len()))
    }
}
