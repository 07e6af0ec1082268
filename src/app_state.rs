//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{
    db::initialize,
    ledger::Ledger,
    models::TransactionKind,
    stores::{CategoryStore, TransactionStore, UserStore},
    Error,
};

#[derive(Clone)]
struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// The state of the REST server: the shared database connection and the keys
/// for signing and verifying bearer tokens.
#[derive(Clone)]
pub struct AppState {
    db_connection: Arc<Mutex<Connection>>,
    jwt_keys: JwtKeys,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, jwt_secret: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            jwt_keys: JwtKeys {
                encoding_key: EncodingKey::from_secret(jwt_secret.as_ref()),
                decoding_key: DecodingKey::from_secret(jwt_secret.as_ref()),
            },
        })
    }

    /// The encoding key for JWTs.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.jwt_keys.encoding_key
    }

    /// The decoding key for JWTs.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.jwt_keys.decoding_key
    }

    /// A user store over the shared connection.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.db_connection.clone())
    }

    /// A category store over the shared connection.
    pub fn categories(&self) -> CategoryStore {
        CategoryStore::new(self.db_connection.clone())
    }

    /// A transaction store for `kind` over the shared connection.
    pub fn transactions(&self, kind: TransactionKind) -> TransactionStore {
        TransactionStore::new(self.db_connection.clone(), kind)
    }

    /// The income store over the shared connection.
    pub fn incomes(&self) -> TransactionStore {
        self.transactions(TransactionKind::Income)
    }

    /// The expense store over the shared connection.
    pub fn expenses(&self) -> TransactionStore {
        self.transactions(TransactionKind::Expense)
    }

    /// The consistency engine over the category and transaction stores.
    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.categories(), self.incomes(), self.expenses())
    }
}
