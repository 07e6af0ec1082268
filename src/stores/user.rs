//! Implements a SQLite backed user store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    db::{CreateTable, MapRow},
    models::{Email, NewUser, RecordId, User},
    Error,
};

/// Creates and retrieves users to/from a SQLite database.
#[derive(Clone)]
pub struct UserStore {
    connection: Arc<Mutex<Connection>>,
}

impl UserStore {
    /// Create a new user store with a SQLite database.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Create a user in the database.
    ///
    /// # Errors
    /// This function will return an error if the email is already registered
    /// or if there is an SQL error.
    pub fn create(&self, new_user: NewUser) -> Result<User, Error> {
        let user = User {
            id: RecordId::generate(),
            email: new_user.email,
            name: new_user.name,
            surname: new_user.surname,
            password_hash: new_user.password_hash,
        };

        self.connection.lock().unwrap().execute(
            "INSERT INTO user (id, email, name, surname, password_hash)
                VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                user.id.as_ref(),
                user.email.as_ref(),
                &user.name,
                &user.surname,
                &user.password_hash,
            ),
        )?;

        Ok(user)
    }

    /// Retrieve the user registered with `email`, if any.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    pub fn get_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, email, name, surname, password_hash FROM user WHERE email = :email",
            )?
            .query_row(&[(":email", &email)], UserStore::map_row)
            .optional()
            .map_err(|error| error.into())
    }
}

impl CreateTable for UserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                surname TEXT NOT NULL,
                password_hash TEXT NOT NULL
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for UserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(User {
            id: RecordId::new_unchecked(row.get(offset)?),
            email: Email::new_unchecked(row.get(offset + 1)?),
            name: row.get(offset + 2)?,
            surname: row.get(offset + 3)?,
            password_hash: row.get(offset + 4)?,
        })
    }
}

#[cfg(test)]
mod user_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        db::initialize,
        models::{Email, NewUser},
        Error,
    };

    use super::UserStore;

    fn get_test_store() -> UserStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        UserStore::new(Arc::new(Mutex::new(connection)))
    }

    fn test_user_data() -> NewUser {
        NewUser {
            email: Email::new("foo@bar.baz").unwrap(),
            name: "Foo".to_string(),
            surname: "Bar".to_string(),
            password_hash: "definitelyapasswordhash".to_string(),
        }
    }

    #[test]
    fn create_user_succeeds() {
        let store = get_test_store();

        let user = store.create(test_user_data()).unwrap();

        assert_eq!(user.email, Email::new("foo@bar.baz").unwrap());
        assert_eq!(user.name, "Foo");
        assert_eq!(user.surname, "Bar");
    }

    #[test]
    fn create_user_fails_on_duplicate_email() {
        let store = get_test_store();

        store.create(test_user_data()).unwrap();
        let result = store.create(test_user_data());

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn get_user_by_email_succeeds() {
        let store = get_test_store();
        let inserted_user = store.create(test_user_data()).unwrap();

        let selected_user = store.get_by_email("foo@bar.baz").unwrap();

        assert_eq!(selected_user, Some(inserted_user));
    }

    #[test]
    fn get_user_by_unknown_email_returns_none() {
        let store = get_test_store();
        store.create(test_user_data()).unwrap();

        let selected_user = store.get_by_email("other@bar.baz").unwrap();

        assert_eq!(selected_user, None);
    }
}
