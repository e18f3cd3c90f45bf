//! Candidate generation strategies for username suggestions
//!
//! Ten strategies in a fixed priority order, each a pure function of the
//! normalized root, an injected random source, and the current year. The
//! random source is passed in explicitly so generation is deterministic
//! and replayable in tests given a fixed seed.
//!
//! The ordering is a design choice, not an optimality claim: the caller
//! shuffles accepted candidates before presenting them, so no single
//! strategy dominates the visible ranking.

use rand::Rng;

/// Character set all generated suffixes draw from
const SUFFIX_CHARSET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Digits for the timestamp fallback encoding
const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Small numbers people actually pick
const CURATED_NUMBERS: [u16; 10] = [1, 2, 3, 7, 9, 21, 42, 77, 99, 123];

/// Short label suffixes
const WORD_SUFFIXES: [&str; 10] = [
    "dev", "io", "hq", "app", "pro", "real", "live", "here", "online", "official",
];

/// Short word tokens for free-form combination
const SHORT_TOKENS: [&str; 10] = [
    "ace", "sky", "fox", "zen", "max", "neo", "ray", "jet", "ash", "oak",
];

/// Short prefixes
const PREFIX_TOKENS: [&str; 8] = ["the", "im", "its", "mr", "ms", "dr", "xo", "el"];

/// Roots longer than this are eligible for truncated variants
const TRUNCATION_THRESHOLD: usize = 8;

/// Length the truncated variants keep
const TRUNCATED_LEN: usize = 6;

/// Generate a random lowercase-alphanumeric suffix of the given length
pub fn random_suffix<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// Encode a millisecond timestamp as compact base36 for the fallback suffix
pub fn encode_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    // digits only contains bytes from BASE36_DIGITS, always valid UTF-8
    String::from_utf8(digits).unwrap_or_default()
}

/// A suggestion-generation strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Root + random alphanumeric suffix, free-form
    RandomSuffix,
    /// Root + small curated integers, with and without separator
    CuratedNumber,
    /// Root + random 2-4 digit number
    RandomDigits,
    /// Root + curated word suffixes, with and without separator
    CuratedWord,
    /// Character insertion at the string midpoint
    MidpointInsert,
    /// Root + random short word token
    RandomWord,
    /// Truncated root + random suffix, for long roots
    TruncatedSuffix,
    /// Current-year and two-digit-year variants
    YearVariant,
    /// Random short prefix and/or suffix combinations
    AffixCombo,
    /// Composite variants mixing truncated fragments, tokens and numbers
    Composite,
}

impl Strategy {
    /// All strategies in fixed priority order
    pub const ALL: [Strategy; 10] = [
        Strategy::RandomSuffix,
        Strategy::CuratedNumber,
        Strategy::RandomDigits,
        Strategy::CuratedWord,
        Strategy::MidpointInsert,
        Strategy::RandomWord,
        Strategy::TruncatedSuffix,
        Strategy::YearVariant,
        Strategy::AffixCombo,
        Strategy::Composite,
    ];

    /// Per-strategy attempt budget within one suggestion call
    pub fn budget(self) -> usize {
        match self {
            Strategy::RandomSuffix => 6,
            Strategy::CuratedNumber => 8,
            Strategy::RandomDigits => 6,
            Strategy::CuratedWord => 8,
            Strategy::MidpointInsert => 4,
            Strategy::RandomWord => 5,
            Strategy::TruncatedSuffix => 4,
            Strategy::YearVariant => 4,
            Strategy::AffixCombo => 6,
            Strategy::Composite => 6,
        }
    }

    /// Propose one candidate for a normalized root
    ///
    /// Returns `None` when the strategy does not apply (for example,
    /// truncation of a root that is already short).
    pub fn propose<R: Rng + ?Sized>(self, root: &str, rng: &mut R, year: i32) -> Option<String> {
        match self {
            Strategy::RandomSuffix => {
                let len = rng.gen_range(2..=4);
                Some(format!("{root}{}", random_suffix(rng, len)))
            }
            Strategy::CuratedNumber => {
                let number = CURATED_NUMBERS[rng.gen_range(0..CURATED_NUMBERS.len())];
                if rng.gen_bool(0.5) {
                    Some(format!("{root}_{number}"))
                } else {
                    Some(format!("{root}{number}"))
                }
            }
            Strategy::RandomDigits => {
                let number = rng.gen_range(10..10_000);
                Some(format!("{root}{number}"))
            }
            Strategy::CuratedWord => {
                let word = WORD_SUFFIXES[rng.gen_range(0..WORD_SUFFIXES.len())];
                if rng.gen_bool(0.5) {
                    Some(format!("{root}_{word}"))
                } else {
                    Some(format!("{root}{word}"))
                }
            }
            Strategy::MidpointInsert => {
                let mid = root.len() / 2;
                if !root.is_char_boundary(mid) {
                    return None;
                }
                let (head, tail) = root.split_at(mid);
                let ch = SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char;
                Some(format!("{head}{ch}{tail}"))
            }
            Strategy::RandomWord => {
                let token = SHORT_TOKENS[rng.gen_range(0..SHORT_TOKENS.len())];
                Some(format!("{root}_{token}"))
            }
            Strategy::TruncatedSuffix => {
                if root.len() <= TRUNCATION_THRESHOLD {
                    return None;
                }
                let truncated = &root[..TRUNCATED_LEN];
                Some(format!("{truncated}{}", random_suffix(rng, 3)))
            }
            Strategy::YearVariant => {
                let short = year.rem_euclid(100);
                match rng.gen_range(0..4) {
                    0 => Some(format!("{root}{year}")),
                    1 => Some(format!("{root}_{year}")),
                    2 => Some(format!("{root}{short:02}")),
                    _ => Some(format!("{root}_{short:02}")),
                }
            }
            Strategy::AffixCombo => {
                let prefix = PREFIX_TOKENS[rng.gen_range(0..PREFIX_TOKENS.len())];
                match rng.gen_range(0..3) {
                    0 => Some(format!("{prefix}_{root}")),
                    1 => Some(format!("{root}_{}", random_suffix(rng, 3))),
                    _ => Some(format!("{prefix}_{root}_{}", random_suffix(rng, 2))),
                }
            }
            Strategy::Composite => {
                let frag_len = root.len().min(4);
                if !root.is_char_boundary(frag_len) {
                    return None;
                }
                let fragment = &root[..frag_len];
                let token = SHORT_TOKENS[rng.gen_range(0..SHORT_TOKENS.len())];
                let number = rng.gen_range(1..100);
                Some(format!("{fragment}{token}{number}"))
            }
        }
    }
}
