//! Hint strings and the bijective letter numbering behind them
//!
//! Hints are bijective base-N numerals over an alphabet: with the default
//! 26-letter alphabet, `1 = a`, `26 = z`, `27 = aa`, `702 = zz`. The
//! numbering order is exactly the pool's preference order (shorter first,
//! then alphabetical), so the universe is generated by counting up.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Default hint alphabet
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// A short, typeable alias for a tree entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hint(String);

impl Hint {
    /// Wrap a string as a hint without validation
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Normalize user input (styled labels may be upper case)
    pub fn parse(input: &str) -> Self {
        Self(input.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Hint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Pool preference order: length ascending, then string ascending
pub fn preference(a: &Hint, b: &Hint) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.0.cmp(&b.0))
}

/// Convert a 1-based number into its hint numeral
///
/// Returns `None` for zero or an empty alphabet.
pub fn number_to_hint(mut num: u64, alphabet: &[char]) -> Option<Hint> {
    if num == 0 || alphabet.is_empty() {
        return None;
    }
    let base = alphabet.len() as u64;
    let mut letters = Vec::new();
    while num > 0 {
        num -= 1;
        letters.push(alphabet[(num % base) as usize]);
        num /= base;
    }
    letters.reverse();
    Some(Hint(letters.into_iter().collect()))
}

/// Inverse of [`number_to_hint`]; `None` if a letter is outside the alphabet
pub fn hint_to_number(hint: &str, alphabet: &[char]) -> Option<u64> {
    if hint.is_empty() {
        return None;
    }
    let base = alphabet.len() as u64;
    let mut num: u64 = 0;
    for ch in hint.chars() {
        let index = alphabet.iter().position(|c| *c == ch)? as u64;
        num = num.checked_mul(base)?.checked_add(index + 1)?;
    }
    Some(num)
}

/// The full set of hints for an alphabet and maximum length, in preference order
#[derive(Debug, Clone)]
pub struct HintUniverse {
    alphabet: Vec<char>,
    max_length: usize,
    size: u64,
}

impl HintUniverse {
    pub fn new(alphabet: &str, max_length: usize) -> Self {
        let alphabet: Vec<char> = alphabet.chars().collect();
        let base = alphabet.len() as u64;
        let mut size: u64 = 0;
        let mut per_length: u64 = 1;
        for _ in 0..max_length {
            per_length = per_length.saturating_mul(base);
            size = size.saturating_add(per_length);
        }
        Self {
            alphabet,
            max_length,
            size,
        }
    }

    /// Number of distinct hints
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Whether `hint` belongs to this universe
    pub fn contains(&self, hint: &Hint) -> bool {
        hint.len() <= self.max_length
            && hint_to_number(hint.as_str(), &self.alphabet).is_some()
    }

    /// All hints, shortest and alphabetically first at the front
    pub fn hints(&self) -> Vec<Hint> {
        (1..=self.size)
            .filter_map(|n| number_to_hint(n, &self.alphabet))
            .collect()
    }
}

impl Default for HintUniverse {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHABET, 2)
    }
}
