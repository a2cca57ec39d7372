//! Password strength policy.
//!
//! Every credential on the platform, whichever role it belongs to, has to
//! pass the same five rules. Validation reports every failing rule at once so
//! a signup form can show them together.

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// One rule of the password policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordRule {
    /// At least [`MIN_PASSWORD_LENGTH`] characters.
    MinLength,
    /// At least one uppercase letter.
    Uppercase,
    /// At least one lowercase letter.
    Lowercase,
    /// At least one digit.
    Digit,
    /// At least one symbol (anything that is not a letter, digit or whitespace).
    Symbol,
}

impl PasswordRule {
    /// All rules, in the order they are checked.
    pub const ALL: [Self; 5] = [
        Self::MinLength,
        Self::Uppercase,
        Self::Lowercase,
        Self::Digit,
        Self::Symbol,
    ];

    /// Whether `password` satisfies this rule.
    #[must_use]
    pub fn is_satisfied_by(self, password: &str) -> bool {
        match self {
            Self::MinLength => password.chars().count() >= MIN_PASSWORD_LENGTH,
            Self::Uppercase => password.chars().any(char::is_uppercase),
            Self::Lowercase => password.chars().any(char::is_lowercase),
            Self::Digit => password.chars().any(|c| c.is_ascii_digit()),
            Self::Symbol => password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        }
    }

    /// Human-readable requirement shown to the user.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MinLength => "password must be at least 8 characters",
            Self::Uppercase => "password must contain an uppercase letter",
            Self::Lowercase => "password must contain a lowercase letter",
            Self::Digit => "password must contain a digit",
            Self::Symbol => "password must contain a symbol",
        }
    }
}

/// A password failed one or more policy rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", describe(.failed))]
pub struct PasswordPolicyError {
    failed: Vec<PasswordRule>,
}

impl PasswordPolicyError {
    /// The rules the password failed, in check order. Never empty.
    #[must_use]
    pub fn failed_rules(&self) -> &[PasswordRule] {
        &self.failed
    }

    /// Messages for every failed rule.
    #[must_use]
    pub fn messages(&self) -> Vec<&'static str> {
        self.failed.iter().map(|rule| rule.message()).collect()
    }
}

fn describe(rules: &[PasswordRule]) -> String {
    rules
        .iter()
        .map(|rule| rule.message())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The platform password policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordPolicy;

impl PasswordPolicy {
    /// Check `password` against every rule.
    ///
    /// # Errors
    ///
    /// Returns `PasswordPolicyError` listing each rule the password fails.
    pub fn validate(self, password: &str) -> Result<(), PasswordPolicyError> {
        let failed: Vec<PasswordRule> = PasswordRule::ALL
            .into_iter()
            .filter(|rule| !rule.is_satisfied_by(password))
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(PasswordPolicyError { failed })
        }
    }
}
