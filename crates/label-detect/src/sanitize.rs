//! Candidate clean-up applied before a label is accepted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::policy::LabelPolicy;

pub const ELLIPSIS: char = '…';

static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\x{1F1E6}-\x{1F1FF}\x{FE0E}\x{FE0F}\x{20E3}]",
    )
    .expect("emoji regex")
});

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?[\d\s.,:/-]*\d[\d\s.,:/%-]*$").expect("numeric label regex")
});

fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
    )
}

/// Punctuation stripped from label edges. Brackets stay so `Name (optional)` survives.
fn is_edge_punctuation(c: char) -> bool {
    match c {
        '(' | ')' | '[' | ']' | '{' | '}' => false,
        '…' | '•' | '·' | '–' | '—' | '“' | '”' | '‘' | '’' | '«' | '»' | '¿' | '¡' | '：' => {
            true
        }
        _ => c.is_ascii_punctuation(),
    }
}

/// Normalize a raw candidate. `None` when nothing readable is left.
pub fn sanitize(raw: &str, policy: &LabelPolicy) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !is_zero_width(*c))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let cleaned = if policy.strip_emoji {
        EMOJI_RE.replace_all(&cleaned, " ").into_owned()
    } else {
        cleaned
    };

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .trim_matches(|c: char| is_edge_punctuation(c) || c.is_whitespace())
        .to_string();
    if trimmed.is_empty() {
        return None;
    }

    Some(truncate(&title_case(&trimmed), policy.max_length))
}

/// Upper-case the first letter of every word, leaving the rest untouched.
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn truncate(text: &str, max_length: usize) -> String {
    let max_length = max_length.max(1);
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_length - 1).collect();
    let kept = out.trim_end().len();
    out.truncate(kept);
    out.push(ELLIPSIS);
    out
}

/// Labels made only of digits and number punctuation carry no meaning.
pub fn is_numeric_label(label: &str) -> bool {
    NUMERIC_RE.is_match(label)
}
