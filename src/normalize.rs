//! Input normalization.
//!
//! Rules are written against single-space separated words with a space on
//! each side, so `" in 3 days "` rather than `"In 3 days!"`.

use crate::grammar::Grammar;

/// Collapse separators to single spaces, fold case unless the grammar is
/// case-sensitive, and pad both ends with one space.
pub fn normalize(text: &str, grammar: &Grammar) -> String {
    let folded = if grammar.case_sensitive() { text.to_string() } else { text.to_lowercase() };
    let split = grammar.word_split().replace_all(&folded, " ");
    format!(" {} ", split.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar(case_sensitive: bool) -> Grammar {
        let mut b = Grammar::builder("xx");
        b.word_split(r"[\s,.!?]+").case_sensitive(case_sensitive);
        b.build().unwrap()
    }

    #[test]
    fn separators_collapse_to_one_space() {
        assert_eq!(normalize("In 3  days,\tplease!", &grammar(false)), " in 3 days please ");
    }

    #[test]
    fn case_is_kept_for_case_sensitive_grammars() {
        assert_eq!(normalize("Next Monday", &grammar(true)), " Next Monday ");
    }

    #[test]
    fn empty_input_is_a_single_gap() {
        assert_eq!(normalize("", &grammar(false)), "  ");
        assert_eq!(normalize(" ,, ", &grammar(false)), "  ");
    }

    #[test]
    fn default_word_split_is_whitespace() {
        let g = Grammar::builder("xx").build().unwrap();
        assert_eq!(normalize("  at\n5pm ", &g), " at 5pm ");
        assert_eq!(normalize("5.30", &g), " 5.30 ");
    }
}
