//! Turning free text into fixed-width numeric vectors.
//!
//! Text is split into lower-cased alphanumeric tokens of at least two characters, common English
//! stop words are removed and every token of the vocabulary becomes one feature, weighted by
//! its [TF-IDF](https://en.wikipedia.org/wiki/Tf%E2%80%93idf) score.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Words that carry no information about a listing.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as",
    "at", "be", "been", "before", "being", "below", "between", "both", "but", "by", "can", "could",
    "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from", "further", "had",
    "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in",
    "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor", "not", "of", "off",
    "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until", "up", "very",
    "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "would", "you", "your", "yours",
];

/// Splits `text` into lower-cased alphanumeric tokens, dropping one-character tokens and stop
/// words.
/// # Example
/// ```
/// # use algorithms::text::tokenize;
/// let tokens: Vec<_> = tokenize("The sunny Loft, 2 min to the U-Bahn!").collect();
/// assert_eq!(tokens, vec!["sunny", "loft", "min", "bahn"]);
/// ```
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(|token| token.to_lowercase())
        .filter(|token| !ENGLISH_STOP_WORDS.contains(&token.as_str()))
}

/// A sparse vector, entries sorted by index and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(u32, f64)>,
}

impl SparseVector {
    /// Creates a vector from arbitrary `(index, value)` pairs. Values for the same index are added.
    pub fn from_entries(mut entries: Vec<(u32, f64)>) -> Self {
        entries.sort_unstable_by_key(|(index, _)| *index);
        let mut merged: Vec<(u32, f64)> = Vec::with_capacity(entries.len());
        for (index, value) in entries {
            match merged.last_mut() {
                Some((last_index, last_value)) if *last_index == index => *last_value += value,
                _ => merged.push((index, value)),
            }
        }
        Self { entries: merged }
    }

    /// The non-zero entries.
    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    /// Is every entry zero?
    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, value)| *value == 0.0)
    }

    /// The euclidean norm.
    pub fn norm(&self) -> f64 {
        self.entries
            .iter()
            .map(|(_, value)| value * value)
            .sum::<f64>()
            .sqrt()
    }

    /// The dot product with `other`.
    pub fn dot(&self, other: &Self) -> f64 {
        let mut sum = 0.0;
        let (mut i, mut j) = (0, 0);
        while i < self.entries.len() && j < other.entries.len() {
            let (index_a, value_a) = self.entries[i];
            let (index_b, value_b) = other.entries[j];
            if index_a == index_b {
                sum += value_a * value_b;
                i += 1;
                j += 1;
            } else if index_a < index_b {
                i += 1;
            } else {
                j += 1;
            }
        }
        sum
    }

    /// Appends `other` behind `self`, where `self` spans `offset` dimensions.
    pub fn concat(mut self, other: &Self, offset: u32) -> Self {
        self.entries.extend(
            other
                .entries
                .iter()
                .map(|(index, value)| (index + offset, *value)),
        );
        self
    }
}

/// The dissimilarity of two vectors is the reciprocal of their cosine similarity.
/// Vectors pointing in the same direction have dissimilarity 1, vectors sharing no dimension
/// (or being zero) have dissimilarity infinity.
pub fn cosine_dissimilarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let sum_of_products = a.dot(b);
    let norms = a.norm() * b.norm();
    if norms == 0.0 || sum_of_products <= 0.0 {
        return f64::INFINITY;
    }
    norms / sum_of_products
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct VocabularyEntry {
    token: String,
    idf: f64,
}

/// Learns a vocabulary and inverse document frequencies and maps text onto L2-normalized TF-IDF
/// vectors of width [width](TfIdfVectorizer::width).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    max_features: usize,
    vocabulary: Vec<VocabularyEntry>,
    #[serde(skip)]
    index: HashMap<String, u32>,
}

impl TfIdfVectorizer {
    /// Creates an unfitted vectorizer which keeps at most `max_features` tokens.
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Learns the vocabulary from `documents`.
    /// The `max_features` tokens occurring most often over all documents are kept, ties are
    /// broken lexicographically. Their idf is `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit<'i>(&mut self, documents: impl IntoIterator<Item = &'i str>) {
        let mut term_counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut document_count = 0usize;

        for document in documents {
            document_count += 1;
            let mut seen_in_document: HashMap<String, usize> = HashMap::new();
            for token in tokenize(document) {
                *seen_in_document.entry(token).or_default() += 1;
            }
            for (token, count) in seen_in_document {
                let entry = term_counts.entry(token).or_default();
                entry.0 += count;
                entry.1 += 1;
            }
        }

        let mut ranked: Vec<(String, usize, usize)> = term_counts
            .into_iter()
            .map(|(token, (total, document_frequency))| (token, total, document_frequency))
            .collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);
        ranked.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let n = document_count as f64;
        self.vocabulary = ranked
            .into_iter()
            .map(|(token, _, document_frequency)| VocabularyEntry {
                token,
                idf: ((1.0 + n) / (1.0 + document_frequency as f64)).ln() + 1.0,
            })
            .collect();
        self.rebuild_index();
        log::debug!(
            "Fitted vocabulary of {} tokens on {} documents",
            self.vocabulary.len(),
            document_count
        );
    }

    /// Must be called after deserializing, since the token lookup is not stored.
    pub fn rebuild_index(&mut self) {
        self.index = self
            .vocabulary
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.token.clone(), position as u32))
            .collect();
    }

    /// The number of features produced by [transform](TfIdfVectorizer::transform).
    pub fn width(&self) -> u32 {
        self.vocabulary.len() as u32
    }

    /// Maps a document onto its normalized TF-IDF vector.
    /// Tokens outside of the vocabulary are ignored, so the result might be zero.
    pub fn transform(&self, document: &str) -> SparseVector {
        let entries: Vec<(u32, f64)> = tokenize(document)
            .filter_map(|token| self.index.get(&token).copied())
            .map(|position| (position, self.vocabulary[position as usize].idf))
            .collect();
        let vector = SparseVector::from_entries(entries);

        let norm = vector.norm();
        if norm == 0.0 {
            return vector;
        }
        SparseVector {
            entries: vector
                .entries
                .into_iter()
                .map(|(index, value)| (index, value / norm))
                .collect(),
        }
    }
}
