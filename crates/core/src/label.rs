//! Hint label decoration

use crate::hint::Hint;
use serde::{Deserialize, Serialize};

/// How hint letters are rendered next to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterStyling {
    #[default]
    Lowercase,
    Uppercase,
    /// Circled capitals (Ⓐ..Ⓩ)
    Emoji,
}

/// Render a hint for display
pub fn format_hint(hint: &Hint, styling: LetterStyling) -> String {
    match styling {
        LetterStyling::Lowercase => hint.as_str().to_lowercase(),
        LetterStyling::Uppercase => hint.as_str().to_uppercase(),
        LetterStyling::Emoji => hint.as_str().chars().map(circled).collect(),
    }
}

fn circled(ch: char) -> char {
    if ch.is_ascii_lowercase() {
        // U+24B6 is CIRCLED LATIN CAPITAL LETTER A
        char::from_u32(0x24B6 + (ch as u32 - 'a' as u32)).unwrap_or(ch)
    } else {
        ch
    }
}
