//! Implements a SQLite backed transaction store.
//!
//! Incomes and expenses share one schema but live in separate tables; a store
//! instance is bound to one [TransactionKind] and reads/writes only that
//! kind's table. Every operation is scoped to the owning user.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    db::MapRow,
    models::{RecordId, Transaction, TransactionKind},
    Error,
};

/// The fields for creating a new transaction, with the category reference
/// already resolved by the ledger.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: String,
    pub amount: f64,
    pub description: String,
    pub category_id: String,
    pub category_name: String,
}

/// Creates and retrieves one kind of transaction to/from a SQLite database.
#[derive(Clone)]
pub struct TransactionStore {
    connection: Arc<Mutex<Connection>>,
    kind: TransactionKind,
}

impl TransactionStore {
    /// Create a new transaction store for `kind` with a SQLite database.
    pub fn new(connection: Arc<Mutex<Connection>>, kind: TransactionKind) -> Self {
        Self { connection, kind }
    }

    /// The kind of transaction this store holds.
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// The not-found error for this store's kind.
    pub fn not_found(&self) -> Error {
        match self.kind {
            TransactionKind::Income => Error::IncomeNotFound,
            TransactionKind::Expense => Error::ExpenseNotFound,
        }
    }

    /// Create a transaction in the database, owned by `user_id`.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn create(
        &self,
        user_id: &RecordId,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        let transaction = Transaction {
            id: RecordId::generate(),
            date: new_transaction.date,
            amount: new_transaction.amount,
            description: new_transaction.description,
            category_id: new_transaction.category_id,
            category_name: new_transaction.category_name,
            user_id: user_id.clone(),
        };

        self.connection.lock().unwrap().execute(
            &format!(
                "INSERT INTO {} (id, date, amount, description, category_id, category_name, user_id)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                self.kind.table()
            ),
            (
                transaction.id.as_ref(),
                &transaction.date,
                transaction.amount,
                &transaction.description,
                &transaction.category_id,
                &transaction.category_name,
                transaction.user_id.as_ref(),
            ),
        )?;

        Ok(transaction)
    }

    /// Retrieve the transaction with `transaction_id` owned by `user_id`, if
    /// any.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn get(
        &self,
        user_id: &RecordId,
        transaction_id: &str,
    ) -> Result<Option<Transaction>, Error> {
        let user_id = user_id.as_ref();

        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT id, date, amount, description, category_id, category_name, user_id
                    FROM {} WHERE id = :id AND user_id = :user_id",
                self.kind.table()
            ))?
            .query_row(
                &[(":id", &transaction_id), (":user_id", &user_id)],
                TransactionStore::map_row,
            )
            .optional()
            .map_err(|error| error.into())
    }

    /// Retrieve all the transactions owned by `user_id`.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn get_all(&self, user_id: &RecordId) -> Result<Vec<Transaction>, Error> {
        let user_id = user_id.as_ref();

        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT id, date, amount, description, category_id, category_name, user_id
                    FROM {} WHERE user_id = :user_id",
                self.kind.table()
            ))?
            .query_map(&[(":user_id", &user_id)], TransactionStore::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
            .collect()
    }

    /// Retrieve the transactions owned by `user_id` whose date falls in the
    /// inclusive range `[start_date, end_date]`.
    ///
    /// Dates are compared as text; ISO dates order lexicographically the same
    /// as chronologically.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn get_in_range(
        &self,
        user_id: &RecordId,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Transaction>, Error> {
        let user_id = user_id.as_ref();

        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT id, date, amount, description, category_id, category_name, user_id
                    FROM {} WHERE user_id = :user_id AND date >= :start AND date <= :end",
                self.kind.table()
            ))?
            .query_map(
                &[
                    (":user_id", &user_id),
                    (":start", &start_date),
                    (":end", &end_date),
                ],
                TransactionStore::map_row,
            )?
            .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
            .collect()
    }

    /// Overwrite an existing transaction with the fields in `transaction`.
    ///
    /// Full replace semantics: every mutable field is written unconditionally.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn update(&self, transaction: &Transaction) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            &format!(
                "UPDATE {} SET date = ?1, amount = ?2, description = ?3,
                    category_id = ?4, category_name = ?5
                    WHERE id = ?6 AND user_id = ?7",
                self.kind.table()
            ),
            (
                &transaction.date,
                transaction.amount,
                &transaction.description,
                &transaction.category_id,
                &transaction.category_name,
                transaction.id.as_ref(),
                transaction.user_id.as_ref(),
            ),
        )?;

        Ok(())
    }

    /// Remove the transaction with `transaction_id` owned by `user_id`.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn delete(&self, user_id: &RecordId, transaction_id: &str) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            &format!(
                "DELETE FROM {} WHERE id = ?1 AND user_id = ?2",
                self.kind.table()
            ),
            (transaction_id, user_id.as_ref()),
        )?;

        Ok(())
    }

    /// Whether any transaction owned by `user_id` references `category_id`.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn references_category(
        &self,
        user_id: &RecordId,
        category_id: &str,
    ) -> Result<bool, Error> {
        let user_id = user_id.as_ref();

        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT EXISTS(
                    SELECT 1 FROM {} WHERE user_id = :user_id AND category_id = :category_id)",
                self.kind.table()
            ))?
            .query_row(
                &[(":user_id", &user_id), (":category_id", &category_id)],
                |row| row.get(0),
            )
            .map_err(|error| error.into())
    }

    /// Set the denormalized category name on every transaction owned by
    /// `user_id` that references `category_id`, returning the number of rows
    /// updated.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn set_category_name(
        &self,
        user_id: &RecordId,
        category_id: &str,
        category_name: &str,
    ) -> Result<usize, Error> {
        self.connection
            .lock()
            .unwrap()
            .execute(
                &format!(
                    "UPDATE {} SET category_name = ?1 WHERE user_id = ?2 AND category_id = ?3",
                    self.kind.table()
                ),
                (category_name, user_id.as_ref(), category_id),
            )
            .map_err(|error| error.into())
    }
}

impl MapRow for TransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Transaction {
            id: RecordId::new_unchecked(row.get(offset)?),
            date: row.get(offset + 1)?,
            amount: row.get(offset + 2)?,
            description: row.get(offset + 3)?,
            category_id: row.get(offset + 4)?,
            category_name: row.get(offset + 5)?,
            user_id: RecordId::new_unchecked(row.get(offset + 6)?),
        })
    }
}

/// Create the `income` and `expense` tables.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for kind in [TransactionKind::Income, TransactionKind::Expense] {
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    date TEXT NOT NULL,
                    amount REAL NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    category_id TEXT NOT NULL DEFAULT '',
                    category_name TEXT NOT NULL DEFAULT '',
                    user_id TEXT NOT NULL
                    )",
                kind.table()
            ),
            (),
        )?;
    }

    Ok(())
}
