use regex::Regex;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-z0-9]+").expect("word pattern is valid")
});

/// Split text into lowercase ASCII alphanumeric runs, in order.
///
/// Indexing and querying must go through this same function, otherwise
/// postings and query terms stop lining up.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}
