//! The domain models shared by the stores, the ledger and the HTTP layer.

use std::fmt::{Display, Write};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{0} is not a valid record identifier")]
pub struct RecordIdError(pub String);

/// A 24-character hexadecimal string, the identifier format for every stored
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a fresh identifier from 12 random bytes.
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4();

        let mut id = String::with_capacity(24);
        for byte in &uuid.as_bytes()[..12] {
            write!(id, "{byte:02x}").expect("writing to a string cannot fail");
        }

        Self(id)
    }

    /// Parse an identifier from client input.
    ///
    /// # Errors
    ///
    /// This function will return an error if `raw` is not a 24-character
    /// hexadecimal string.
    pub fn parse(raw: &str) -> Result<Self, RecordIdError> {
        if raw.len() == 24 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(RecordIdError(raw.to_string()))
        }
    }

    /// Create a `RecordId` without validation.
    ///
    /// The caller should ensure that `raw` is a 24-character hexadecimal
    /// string coming from a trusted source such as the application's database.
    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{0} is not a valid email address")]
pub struct EmailAddressError(pub String);

/// A validated email address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// # Errors
    ///
    /// This function will return an error if `raw_email` is not a valid email
    /// address.
    pub fn new(raw_email: &str) -> Result<Self, EmailAddressError> {
        if raw_email.contains('@') && !raw_email.is_empty() {
            Ok(Self(raw_email.to_string()))
        } else {
            Err(EmailAddressError(raw_email.to_string()))
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// The caller should ensure that `raw_email` is a correctly formatted
    /// email address, e.g. a value read back from the application's database.
    pub fn new_unchecked(raw_email: String) -> Self {
        Self(raw_email)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user of the application.
///
/// Immutable after registration; owns categories and transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: RecordId,
    pub email: Email,
    pub name: String,
    pub surname: String,
    pub password_hash: String,
}

/// The data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub surname: String,
    pub password_hash: String,
}

/// A label for grouping transactions, e.g. "Mercado" or "Salário".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub user_id: RecordId,
}

/// The two kinds of transaction, kept in separate tables with an identical
/// schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// The database table that holds this kind of transaction.
    pub(crate) fn table(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The label used for this kind in dashboard chart data.
    pub fn chart_group(self) -> &'static str {
        match self {
            TransactionKind::Income => "Receitas",
            TransactionKind::Expense => "Despesas",
        }
    }
}

/// A dated monetary entry (an income or an expense).
///
/// `category_id` is the empty string when the transaction has no category;
/// `category_name` is a denormalized copy of the referenced category's name,
/// kept in sync by the rename cascade in [crate::ledger].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: RecordId,
    pub date: String,
    pub amount: f64,
    pub description: String,
    pub category_id: String,
    pub category_name: String,
    pub user_id: RecordId,
}


#[cfg(test)]
mod email_tests {
    use super::{Email, EmailAddressError};

    #[test]
    fn create_email_success() {
        let email = Email::new("foo@bar.baz");

        assert!(email.is_ok())
    }

    #[test]
    fn create_email_fails_with_no_at_symbol() {
        let email = Email::new("foobar.baz");

        assert!(matches!(email, Err(EmailAddressError(_))));
    }

    #[test]
    fn create_email_fails_with_empty_string() {
        let email = Email::new("");

        assert!(matches!(email, Err(EmailAddressError(_))));
    }
}
