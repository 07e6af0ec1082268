/*! This module defines traits for creating the application's database schema
and mapping rows to the domain models, plus one-time initialization. */

use rusqlite::{Connection, Row, Transaction as SqlTransaction};

use crate::{
    stores::{category::CategoryStore, transaction, user::UserStore},
    Error,
};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create the table(s) for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a
/// concrete rust type.
pub trait MapRow {
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// **Note:** This function expects that the row object contains all the
    /// table columns in the order they were defined.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the
    /// corresponding rust type, or if an invalid column index was used.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type, reading from the column `offset`.
    ///
    /// This is useful in cases where tables have been joined and you want to
    /// construct two different types from the one query.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the
    /// corresponding rust type, or if an invalid column index was used.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// Create the tables for all the domain models.
///
/// Safe to call on an already-initialized database: tables are only created
/// where missing.
///
/// # Errors
/// Returns an error if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    UserStore::create_table(&transaction)?;
    CategoryStore::create_table(&transaction)?;
    transaction::create_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
