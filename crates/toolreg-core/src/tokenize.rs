//! Free-text tokenizer used to derive search keywords.

use std::collections::BTreeSet;

/// Tokens of this many characters or fewer are discarded.
pub const MAX_DISCARDED_LEN: usize = 2;

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '_' | ',')
}

/// Lower-case `text`, split it on runs of whitespace, `-`, `_` and `,`, and
/// keep the distinct tokens longer than [`MAX_DISCARDED_LEN`] characters.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(is_separator)
        .filter(|token| token.chars().count() > MAX_DISCARDED_LEN)
        .map(str::to_string)
        .collect()
}
