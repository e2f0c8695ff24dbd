//! Case-folded, punctuation-free tokens shared by query and chunk scoring.

/// Function words ignored when measuring query-term overlap. Sorted for
/// binary search.
const STOP_WORDS: &[&str] = &[
    "a", "about", "am", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by",
    "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he", "her",
    "his", "how", "i", "if", "in", "into", "is", "it", "its", "me", "my", "of", "on", "or",
    "our", "please", "she", "should", "so", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "to", "was", "we", "were", "what", "when",
    "where", "which", "who", "whom", "why", "will", "with", "would", "you", "your",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Lowercase alphanumeric runs. Apostrophes inside words are dropped, so
/// "Newton's" and "newtons" produce the same token.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if matches!(c, '\'' | '\u{2019}') {
            continue;
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_words_are_sorted() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }

    #[test]
    fn tokenize_folds_case_and_strips_punctuation() {
        assert_eq!(
            tokenize("Newton's First-Law, (F = ma)!"),
            vec!["newtons", "first", "law", "f", "ma"]
        );
    }

    #[test]
    fn tokenize_handles_unicode_letters() {
        assert_eq!(tokenize("Über Größe"), vec!["über", "größe"]);
        assert_eq!(tokenize("Newton’s law"), vec!["newtons", "law"]);
    }

    #[test]
    fn tokenize_empty_and_symbol_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("?! -- ...").is_empty());
    }

    #[test]
    fn recognises_stop_words() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("what"));
        assert!(!is_stop_word("inertia"));
    }
}
