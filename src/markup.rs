use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static BOLD_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold markup pattern"));

static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "[",
        r"\x{1F000}-\x{1FAFF}",
        r"\x{2600}-\x{27BF}",
        r"\x{2B00}-\x{2BFF}",
        r"\x{231A}\x{231B}\x{23CF}\x{23E9}-\x{23F3}\x{23F8}-\x{23FA}",
        r"\x{24C2}\x{3030}\x{303D}\x{3297}\x{3299}",
        r"\x{FE00}-\x{FE0F}\x{200D}\x{20E3}",
        r"\x{E0020}-\x{E007F}",
        "]+"
    ))
    .expect("emoji pattern")
});

/// Characters stripped from both ends of a word before highlight matching.
pub const WORD_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', '"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', ':', ';', '(',
    ')', '[', ']',
];

pub fn normalize_word(word: &str) -> &str {
    word.trim_matches(WORD_PUNCTUATION)
}

/// Split `**phrase**` markup into plain text and the set of highlighted words.
///
/// Unterminated markers are not matched and stay in the output literally.
pub fn parse_bold(text: &str) -> (String, HashSet<String>) {
    if text.is_empty() {
        return (String::new(), HashSet::new());
    }
    let mut bold_words = HashSet::new();
    for caps in BOLD_SPAN.captures_iter(text) {
        for word in caps[1].split_whitespace() {
            let word = normalize_word(word);
            if !word.is_empty() {
                bold_words.insert(word.to_string());
            }
        }
    }
    let clean = BOLD_SPAN.replace_all(text, "$1").into_owned();
    (clean, bold_words)
}

/// Remove emoji, variation selectors and joiners, then trim.
pub fn strip_emojis(text: &str) -> String {
    EMOJI.replace_all(text, "").trim().to_string()
}

/// Title and body ready for the overlay renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub title: String,
    pub body: String,
    pub bold_words: HashSet<String>,
}

impl TextBlock {
    pub fn from_raw(title: &str, body: &str) -> Self {
        let (body, bold_words) = parse_bold(&strip_emojis(body));
        Self {
            title: strip_emojis(title),
            body,
            bold_words,
        }
    }

    pub fn is_highlighted(&self, word: &str) -> bool {
        self.bold_words.contains(normalize_word(word))
    }
}
