//! Password-acceptance policy.
//!
//! A pure, side-effect-free whitelist validator. The character-set check is
//! unconditional for both password fields; length, class coverage, and the
//! blocklist apply only when complexity is required (work passwords).
//!
//! Rules run in order and short-circuit on the first failure.

/// Symbols permitted in generated passwords. Anything outside ASCII
/// letters, digits, and this set (whitespace, emoji, non-ASCII) is
/// rejected outright.
pub const VALID_SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Minimum length for complexity-required passwords.
pub const MIN_LENGTH: usize = 12;

/// Known-weak strings rejected outright, matched case-insensitively.
pub const BLOCKLIST: &[&str] = &[
    "password",
    "12345678",
    "qwertyuiop",
    "password123",
    "password123!",
    "admin123",
    "welcome1",
    "welcome1!",
    "changeme",
    "sunshine",
    "football",
    "p@ssword",
    "123456789",
    "iloveyou",
    "monkey",
    "dragon",
    "letmein",
    "p@$$w0rd",
    "spring2026",
    "summer2026",
    "winter2026",
    "autumn2026",
    "password!",
    "admin!123",
    "adminadmin",
];

/// Why a candidate password was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Empty or absent string
    Empty,
    /// Character outside the allowed ASCII set
    Pattern,
    /// Too short or insufficient character-class coverage
    Complexity,
    /// Case-insensitive match against the known-weak blocklist
    Blocklist,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Empty => "empty",
            Self::Pattern => "pattern",
            Self::Complexity => "complexity",
            Self::Blocklist => "blocklist",
        };
        f.write_str(s)
    }
}

/// Password policy with operator-configurable blocklist enforcement.
#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    blocklist_enabled: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            blocklist_enabled: true,
        }
    }
}

impl PasswordPolicy {
    pub fn new(blocklist_enabled: bool) -> Self {
        Self { blocklist_enabled }
    }

    /// Validate a candidate password.
    ///
    /// With `require_complexity` false (personal roots) only the emptiness
    /// and character-set rules apply; the root may be weak on purpose —
    /// that weakness is the research signal.
    pub fn validate(&self, password: &str, require_complexity: bool) -> Result<(), RejectReason> {
        if password.is_empty() {
            return Err(RejectReason::Empty);
        }

        if !password.chars().all(is_allowed_char) {
            return Err(RejectReason::Pattern);
        }

        if !require_complexity {
            return Ok(());
        }

        if password.len() < MIN_LENGTH {
            return Err(RejectReason::Complexity);
        }

        let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        let has_symbol = password.chars().any(|c| VALID_SYMBOLS.contains(c));

        let classes = [has_lower, has_upper, has_digit, has_symbol]
            .iter()
            .filter(|&&b| b)
            .count();
        if classes < 3 {
            return Err(RejectReason::Complexity);
        }

        if self.blocklist_enabled && BLOCKLIST.iter().any(|b| b.eq_ignore_ascii_case(password)) {
            return Err(RejectReason::Blocklist);
        }

        Ok(())
    }
}

/// Validate with the default policy (blocklist enforced).
pub fn validate(password: &str, require_complexity: bool) -> Result<(), RejectReason> {
    PasswordPolicy::default().validate(password, require_complexity)
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || VALID_SYMBOLS.contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rejected() {
        assert_eq!(validate("", true), Err(RejectReason::Empty));
        assert_eq!(validate("", false), Err(RejectReason::Empty));
    }

    #[test]
    fn test_short_passwords_fail_complexity() {
        for pw in ["a", "Ab1!", "Sh0rt!pass", "elevenchars"] {
            assert_eq!(validate(pw, true), Err(RejectReason::Complexity), "{pw}");
        }
    }

    #[test]
    fn test_out_of_set_chars_rejected_in_both_modes() {
        for pw in ["has space123!", "emoji😀Password1!", "tab\tseparated1!", "naïvePassword1!"] {
            assert_eq!(validate(pw, true), Err(RejectReason::Pattern), "{pw}");
            assert_eq!(validate(pw, false), Err(RejectReason::Pattern), "{pw}");
        }
    }

    #[test]
    fn test_pattern_check_precedes_length() {
        // shorter than 12 AND contains a space: pattern wins
        assert_eq!(validate("a b", true), Err(RejectReason::Pattern));
    }

    #[test]
    fn test_strong_password_accepted() {
        assert_eq!(validate("Tr0ub4dor&3Long!", true), Ok(()));
    }

    #[test]
    fn test_three_of_four_classes_sufficient() {
        // lower + upper + digit, no symbol
        assert_eq!(validate("Troubadour3long", true), Ok(()));
        // lower + digit only
        assert_eq!(validate("troubadour3long", true), Err(RejectReason::Complexity));
    }

    #[test]
    fn test_blocklist_case_insensitive() {
        assert_eq!(validate("password123!", true), Err(RejectReason::Blocklist));
        assert_eq!(validate("PASSWORD123!", true), Err(RejectReason::Blocklist));
        assert_eq!(validate("P@$$w0rd", true), Err(RejectReason::Complexity)); // too short first
    }

    #[test]
    fn test_blocklist_can_be_disabled() {
        let policy = PasswordPolicy::new(false);
        assert_eq!(policy.validate("password123!", true), Ok(()));
    }

    #[test]
    fn test_personal_root_skips_complexity_and_blocklist() {
        // weak roots are the point of the study; only the character set holds
        assert_eq!(validate("fluffy", false), Ok(()));
        assert_eq!(validate("password", false), Ok(()));
    }
}
