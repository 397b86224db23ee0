//! Value objects for the member graph

use serde::{Deserialize, Serialize};

/// Number of digits after the prefix in an issued code.
pub const CODE_DIGITS: usize = 5;
/// Lowest numeric suffix an allocator issues.
pub const CODE_MIN: u32 = 10_000;
/// Highest numeric suffix an allocator issues.
pub const CODE_MAX: u32 = 99_999;

/// Sentinel a signup may use to name the root as sponsor.
pub const ROOT_SENTINEL: &str = "root";

/// How a signup names its sponsor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SponsorReference {
    Root,
    Code(String),
    Username(String),
}

impl SponsorReference {
    /// Parse a raw reference. Returns `None` for a blank input.
    ///
    /// `root` matches case-insensitively. Anything shaped like
    /// `<sponsor_code_prefix><5 digits>` is a code; the rest are usernames.
    pub fn parse(raw: &str, sponsor_code_prefix: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.eq_ignore_ascii_case(ROOT_SENTINEL) {
            return Some(Self::Root);
        }

        if is_code(trimmed, sponsor_code_prefix) {
            return Some(Self::Code(trimmed.to_string()));
        }

        Some(Self::Username(trimmed.to_string()))
    }
}

/// Format a code from a prefix and a numeric suffix.
pub fn format_code(prefix: &str, number: u32) -> String {
    format!("{}{:0width$}", prefix, number, width = CODE_DIGITS)
}

/// Whether `candidate` is `prefix` followed by exactly five digits.
pub fn is_code(candidate: &str, prefix: &str) -> bool {
    match candidate.strip_prefix(prefix) {
        Some(rest) => rest.len() == CODE_DIGITS && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
