//! Implements a SQLite backed category store.
//!
//! The store only performs owner-scoped reads and raw writes; the reference
//! checks and the rename cascade that guard category mutation live in
//! [crate::ledger].

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    db::{CreateTable, MapRow},
    models::{Category, RecordId},
    Error,
};

/// Creates and retrieves transaction categories to/from a SQLite database.
///
/// Every operation is scoped to the owning user.
#[derive(Clone)]
pub struct CategoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl CategoryStore {
    /// Create a new category store with a SQLite database.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Create a category in the database.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn create(
        &self,
        user_id: &RecordId,
        name: String,
        description: String,
    ) -> Result<Category, Error> {
        let category = Category {
            id: RecordId::generate(),
            name,
            description,
            user_id: user_id.clone(),
        };

        self.connection.lock().unwrap().execute(
            "INSERT INTO category (id, name, description, user_id) VALUES (?1, ?2, ?3, ?4)",
            (
                category.id.as_ref(),
                &category.name,
                &category.description,
                category.user_id.as_ref(),
            ),
        )?;

        Ok(category)
    }

    /// Retrieve the category with `category_id` owned by `user_id`, if any.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn get(&self, user_id: &RecordId, category_id: &str) -> Result<Option<Category>, Error> {
        let user_id = user_id.as_ref();

        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, name, description, user_id FROM category
                    WHERE id = :id AND user_id = :user_id",
            )?
            .query_row(
                &[(":id", &category_id), (":user_id", &user_id)],
                CategoryStore::map_row,
            )
            .optional()
            .map_err(|error| error.into())
    }

    /// Retrieve all the categories owned by `user_id`.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn get_all(&self, user_id: &RecordId) -> Result<Vec<Category>, Error> {
        let user_id = user_id.as_ref();

        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, name, description, user_id FROM category WHERE user_id = :user_id")?
            .query_map(&[(":user_id", &user_id)], CategoryStore::map_row)?
            .map(|maybe_category| maybe_category.map_err(|error| error.into()))
            .collect()
    }

    /// Overwrite the name and description of an existing category.
    ///
    /// Full replace semantics: both fields are written unconditionally.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn update(&self, category: &Category) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            "UPDATE category SET name = ?1, description = ?2 WHERE id = ?3 AND user_id = ?4",
            (
                &category.name,
                &category.description,
                category.id.as_ref(),
                category.user_id.as_ref(),
            ),
        )?;

        Ok(())
    }

    /// Remove the category with `category_id` owned by `user_id`.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn delete(&self, user_id: &RecordId, category_id: &str) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, user_id.as_ref()),
        )?;

        Ok(())
    }
}

impl CreateTable for CategoryStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS category (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                user_id TEXT NOT NULL
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for CategoryStore {
    type ReturnType = Category;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Category {
            id: RecordId::new_unchecked(row.get(offset)?),
            name: row.get(offset + 1)?,
            description: row.get(offset + 2)?,
            user_id: RecordId::new_unchecked(row.get(offset + 3)?),
        })
    }
}
