#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let tokens = segsearch::utils::tokenize(s);
        for token in &tokens {
            assert!(!token.is_empty());
            assert!(token.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        }
        // Tokenizing the joined tokens is a fixed point
        assert_eq!(segsearch::utils::tokenize(&tokens.join(" ")), tokens);
    }
});
