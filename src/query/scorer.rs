//! Ranking for keyword queries.
//!
//! Plain tf-idf with a square-root length penalty:
//!
//! ```text
//! idf(t)   = ln((N + 1) / (df(t) + 1)) + 1
//! score(d) = sum over query terms t in d of tf(t, d) * idf(t)  /  sqrt(len(d))
//! ```
//!
//! `df` is the sum of segment-local document frequencies, so documents that
//! are tombstoned but not yet reclaimed still count toward it until their
//! segment is rewritten.

/// Scores documents against a corpus of `N` documents
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    corpus_size: f64,
}

impl Scorer {
    /// `total_docs` of 0 is treated as 1
    pub fn new(total_docs: u64) -> Self {
        Self {
            corpus_size: total_docs.max(1) as f64,
        }
    }

    /// Inverse document frequency for a term appearing in `df` documents
    pub fn idf(&self, df: u64) -> f64 {
        ((self.corpus_size + 1.0) / (df as f64 + 1.0)).ln() + 1.0
    }

    /// Score a document of `doclen` tokens from `(tf, df)` per matched query term
    pub fn score<I>(&self, doclen: u32, matches: I) -> f64
    where
        I: IntoIterator<Item = (u32, u64)>,
    {
        let raw: f64 = matches
            .into_iter()
            .filter(|&(tf, _)| tf > 0)
            .map(|(tf, df)| tf as f64 * self.idf(df))
            .sum();
        raw / (doclen.max(1) as f64).sqrt()
    }
}
