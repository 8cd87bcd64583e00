//! Training vocabulary and symptom matching
//!
//! The vocabulary keeps the artifact's insertion order; that order decides
//! which entry wins an ambiguous partial match, so it must never be rebuilt
//! from a hash set at runtime.

use super::normalize;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct VocabularyEntry {
    canonical: String,
    normalized: String,
}

/// Known symptom strings in load order, with precomputed normalized forms
#[derive(Debug, Clone, Default)]
pub struct SymptomVocabulary {
    entries: Vec<VocabularyEntry>,
    exact: HashMap<String, usize>,
}

impl SymptomVocabulary {
    /// Build from canonical entries. Duplicate normalized forms keep the
    /// first entry; the artifact loader rejects them before this point.
    pub fn new<I, S>(symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::default();
        for symptom in symptoms {
            let canonical = symptom.into();
            let normalized = normalize(&canonical);
            if vocabulary.exact.contains_key(&normalized) {
                continue;
            }
            vocabulary
                .exact
                .insert(normalized.clone(), vocabulary.entries.len());
            vocabulary.entries.push(VocabularyEntry {
                canonical,
                normalized,
            });
        }
        vocabulary
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical entries in load order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.canonical.as_str())
    }

    /// Canonical entries sorted alphabetically, for listings
    pub fn sorted(&self) -> Vec<&str> {
        let mut symptoms: Vec<&str> = self.iter().collect();
        symptoms.sort_unstable();
        symptoms
    }
}

/// Map a normalized input onto the closest vocabulary entry.
///
/// Exact equality is tried first so a short partial hit can never shadow a
/// full-name match. Partial matching accepts containment in either direction
/// and returns the first entry in vocabulary order. Callers must drop empty
/// inputs beforehand: the empty string is contained in every entry.
pub fn match_symptom<'v>(normalized: &str, vocabulary: &'v SymptomVocabulary) -> Option<&'v str> {
    if let Some(&idx) = vocabulary.exact.get(normalized) {
        return Some(vocabulary.entries[idx].canonical.as_str());
    }
    vocabulary
        .entries
        .iter()
        .find(|e| e.normalized.contains(normalized) || normalized.contains(e.normalized.as_str()))
        .map(|e| e.canonical.as_str())
}
