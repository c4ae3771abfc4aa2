use crate::error::Result;
use crate::index::engine::IndexEngine;
use crate::index::types::SearchHit;
use crate::query::scorer::Scorer;
use crate::utils::tokenize;
use roaring::RoaringTreemap;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Runs a keyword query across every open segment
pub struct QueryExecutor<'a> {
    engine: &'a IndexEngine,
    scorer: Scorer,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(engine: &'a IndexEngine) -> Self {
        Self {
            engine,
            scorer: Scorer::new(engine.total_docs()),
        }
    }

    /// Execute a query and return the top `k` hits, best first
    pub fn execute(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let terms = tokenize(query);
        if terms.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let candidates = self.collect_candidates(&terms)?;
        let doc_freqs = self.global_doc_freqs(&terms)?;
        let segments = self.engine.segments();

        let mut hits = Vec::with_capacity(candidates.len() as usize);
        for doc_id in candidates.iter() {
            let Some(index) = self.engine.segment_of(doc_id) else {
                continue;
            };
            let segment = &segments[index];
            let Some(doc) = segment.docs()?.get(&doc_id) else {
                continue;
            };
            let doclen = segment.doclen()?.get(&doc_id).copied().unwrap_or(1);

            let mut matches = Vec::with_capacity(terms.len());
            for term in &terms {
                let tf = segment.term_freq(term, doc_id)?;
                if tf > 0 {
                    matches.push((tf, doc_freqs[term.as_str()]));
                }
            }

            hits.push(SearchHit {
                score: self.scorer.score(doclen, matches),
                document: doc.clone(),
            });
        }

        // Stable sort over ascending ids, so ties keep the lower id first
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);

        debug!(query, terms = terms.len(), candidates = candidates.len(), hits = hits.len(), "executed query");
        Ok(hits)
    }

    /// Union of posting lists for every term over every segment, minus tombstones
    fn collect_candidates(&self, terms: &[String]) -> Result<RoaringTreemap> {
        let mut candidates = RoaringTreemap::new();
        for segment in self.engine.segments() {
            let postings = segment.postings()?;
            for term in terms {
                if let Some(doc_map) = postings.get(term) {
                    candidates.extend(doc_map.keys().copied());
                }
            }
        }
        candidates -= &self.engine.deleted;
        Ok(candidates)
    }

    /// Document frequency per distinct term, summed over all open segments
    fn global_doc_freqs<'t>(&self, terms: &'t [String]) -> Result<FxHashMap<&'t str, u64>> {
        let mut doc_freqs = FxHashMap::with_capacity_and_hasher(terms.len(), Default::default());
        for term in terms {
            if doc_freqs.contains_key(term.as_str()) {
                continue;
            }
            let mut df = 0u64;
            for segment in self.engine.segments() {
                df += segment.doc_freq(term)? as u64;
            }
            doc_freqs.insert(term.as_str(), df);
        }
        Ok(doc_freqs)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::index::engine::IndexEngine;
    use crate::index::types::SourceDocument;

    fn engine_with(dir: &std::path::Path, docs: &[(&str, &str)]) -> IndexEngine {
        let config = EngineConfig {
            sync_writes: false,
            ..EngineConfig::default()
        };
        let mut engine = IndexEngine::open_with_config(dir, config).unwrap();
        engine
            .ingest_batch(
                docs.iter()
                    .map(|(path, text)| SourceDocument::new("", *path, *text))
                    .collect(),
            )
            .unwrap();
        engine
    }

    #[test]
    fn test_apple_example_ranking() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(dir.path(), &[("a.txt", "apple"), ("b.txt", "apple banana")]);

        let hits = engine.search("apple", 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.id, 1);
        assert_eq!(hits[1].document.id, 2);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
        assert!((hits[1].score - 1.0 / 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_query_and_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(dir.path(), &[("a.txt", "apple")]);

        assert!(engine.search("", 10).unwrap().is_empty());
        assert!(engine.search("!!! ---", 10).unwrap().is_empty());
        assert!(engine.search("durian", 10).unwrap().is_empty());
        assert!(engine.search("apple", 0).unwrap().is_empty());
    }

    #[test]
    fn test_top_k_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(
            dir.path(),
            &[("a.txt", "kiwi"), ("b.txt", "kiwi kiwi"), ("c.txt", "kiwi lime"), ("d.txt", "lime")],
        );

        let hits = engine.search("kiwi", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_repeated_query_terms_count_twice() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(dir.path(), &[("a.txt", "plum")]);

        let once = engine.search("plum", 1).unwrap()[0].score;
        let twice = engine.search("plum plum", 1).unwrap()[0].score;
        assert!((twice - 2.0 * once).abs() < 1e-9);
    }

    #[test]
    fn test_tombstoned_docs_excluded_but_still_count_in_df() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_with(dir.path(), &[("a.txt", "fig"), ("b.txt", "fig"), ("c.txt", "pear")]);
        let before = engine.search("fig", 10).unwrap();
        assert_eq!(before.len(), 2);

        engine.delete_by_id(1).unwrap();
        let after = engine.search("fig", 10).unwrap();

        assert_eq!(after.len(), 1);
        assert_eq!(after[0].document.id, 2);
        // df still 2 until the segment is rewritten
        assert!((after[0].score - before[1].score).abs() < 1e-9);
    }

    #[test]
    fn test_search_spans_segments() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_with(dir.path(), &[("a.txt", "grape vine")]);
        engine
            .ingest_batch(vec![SourceDocument::new("", "b.txt", "grape juice")])
            .unwrap();

        let hits = engine.search("grape", 10).unwrap();
        let mut ids: Vec<u64> = hits.iter().map(|h| h.document.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }
}
