//! Contains the SQLite backed stores for the domain [models](crate::models).

pub mod category;
pub mod transaction;
pub mod user;

pub use category::CategoryStore;
pub use transaction::TransactionStore;
pub use user::UserStore;
