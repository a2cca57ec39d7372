//! Login email address.

use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Longest address accepted, per the SMTP path limit.
const MAX_ADDRESS_LEN: usize = 254;

/// Why a string was rejected as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is required")]
    Empty,
    #[error("email is longer than {limit} characters")]
    TooLong { limit: usize },
    #[error("email has no '@'")]
    MissingAtSymbol,
    #[error("email has more than one '@'")]
    MultipleAtSymbols,
    #[error("email is missing the mailbox before '@'")]
    EmptyLocalPart,
    #[error("email is missing the domain after '@'")]
    EmptyDomain,
    #[error("email contains whitespace")]
    ContainsWhitespace,
}

/// A trimmed, lowercased email address.
///
/// The address is the login handle and is unique across identities, so
/// `Manager@Test.com` and `manager@test.com` name the same account.
///
/// ```
/// use plated_core::Email;
///
/// let email = Email::parse("  Manager@Test.com ").unwrap();
/// assert_eq!(email.as_str(), "manager@test.com");
/// assert!(Email::parse("a@b@c").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalise `raw` into an address.
    ///
    /// # Errors
    ///
    /// Fails when the lowercased input is blank, over 254 bytes, contains
    /// whitespace, or is not exactly `local@domain` with both halves present.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        // Lowercasing can grow a string, so limits apply to the stored form
        let address = raw.trim().to_lowercase();

        match address.len() {
            0 => return Err(EmailError::Empty),
            len if len > MAX_ADDRESS_LEN => {
                return Err(EmailError::TooLong {
                    limit: MAX_ADDRESS_LEN,
                });
            }
            _ => {}
        }
        if address.contains(char::is_whitespace) {
            return Err(EmailError::ContainsWhitespace);
        }

        let mut halves = address.split('@');
        let local = halves.next().unwrap_or_default();
        let domain = halves.next().ok_or(EmailError::MissingAtSymbol)?;
        if halves.next().is_some() {
            return Err(EmailError::MultipleAtSymbols);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(address))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
