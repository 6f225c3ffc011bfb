//! Drug name matching against the catalog.
//!
//! Two stages:
//! - Exact substring: a query contained in a catalog name scores 100 and
//!   short-circuits everything else.
//! - Token-sort similarity: Indel ratio (insertions and deletions only) over
//!   the token-sorted strings, filtered by the configured threshold.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::ExtractorConfig;
use crate::models::{sort_tokens, DrugCandidate, DrugCatalog, CONFIRMED_SCORE};

/// Fuzzy matcher over a shared, read-only catalog.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    catalog: Arc<DrugCatalog>,
    threshold: f64,
    candidate_multiplier: usize,
}

impl FuzzyMatcher {
    /// Create a matcher using the threshold and pool size from `config`.
    pub fn new(catalog: Arc<DrugCatalog>, config: &ExtractorConfig) -> Self {
        Self {
            catalog,
            threshold: config.threshold,
            candidate_multiplier: config.candidate_multiplier.max(1),
        }
    }

    pub fn catalog(&self) -> &DrugCatalog {
        &self.catalog
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Best catalog matches for `query`, highest score first, at most `limit`.
    ///
    /// An empty result means no confident match.
    pub fn top_matches(&self, query: &str, limit: usize) -> Vec<DrugCandidate> {
        if limit == 0 {
            return Vec::new();
        }

        let query_lower = query.to_lowercase();

        // 1. Substring containment wins outright
        let exact: Vec<DrugCandidate> = self
            .catalog
            .entries()
            .iter()
            .filter(|e| e.folded.contains(&query_lower))
            .take(limit)
            .map(|e| DrugCandidate::new(e.name.clone(), CONFIRMED_SCORE))
            .collect();

        if !exact.is_empty() {
            return exact;
        }

        // 2. Score every entry and keep the raw candidate pool
        let query_sorted = sort_tokens(&query_lower);
        let mut scored: Vec<DrugCandidate> = self
            .catalog
            .entries()
            .iter()
            .map(|e| {
                DrugCandidate::new(
                    e.name.clone(),
                    similarity_percent(&query_sorted, &e.sorted_tokens),
                )
            })
            .collect();

        sort_descending(&mut scored);
        scored.truncate(limit.saturating_mul(self.candidate_multiplier));

        // 3. Threshold, 4. rank and truncate
        let mut confident: Vec<DrugCandidate> = scored
            .into_iter()
            .filter(|c| c.score >= self.threshold)
            .collect();

        sort_descending(&mut confident);
        confident.truncate(limit);
        confident
    }
}

/// Token-sort similarity (0.0 - 100.0), case-insensitive.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a = sort_tokens(&a.to_lowercase());
    let b = sort_tokens(&b.to_lowercase());
    similarity_percent(&a, &b)
}

/// Indel similarity: `2 * lcs / (len_a + len_b)`, as a percentage.
fn similarity_percent(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    100.0 * (2 * longest_common_subsequence(&a, &b)) as f64 / total as f64
}

/// Length of the longest common subsequence, two-row DP.
fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];

    for &x in long {
        for (j, &y) in short.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// Stable sort by score, highest first.
fn sort_descending(candidates: &mut [DrugCandidate]) {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}
