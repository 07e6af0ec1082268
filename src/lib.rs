//! Financas is a personal finance tracking API.
//!
//! This library provides a JSON REST API for registering users and recording
//! categorized incomes and expenses, plus dashboard aggregations over date
//! ranges. Categories and the transactions that reference them are kept
//! consistent by the [ledger] module: a referenced category cannot be deleted,
//! and renaming a category immediately updates the denormalized name copies on
//! every referencing transaction.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
pub mod auth;
mod config;
pub mod dashboard;
pub mod db;
mod endpoints;
pub mod ledger;
pub mod models;
mod routes;
pub mod stores;

pub use app_state::AppState;
pub use config::Config;
pub use routes::build_router;

use crate::models::{EmailAddressError, RecordIdError};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// Every variant's display string is the message the client receives; business
/// and validation failures map to 400, internal failures to 500.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email given at registration already belongs to a user.
    #[error("E-mail já cadastrado.")]
    EmailTaken,

    /// No email was supplied.
    #[error("E-mail é obrigatório!")]
    EmailRequired,

    /// The supplied email is not a valid address.
    #[error("E-mail inválido!")]
    EmailInvalid,

    /// No name was supplied.
    #[error("Nome é obrigatório!")]
    NameRequired,

    /// No password was supplied.
    #[error("Senha é obrigatória!")]
    PasswordRequired,

    /// The email given at login does not belong to any user.
    #[error("E-mail não cadastrado!")]
    EmailNotFound,

    /// The password given at login does not match the stored hash.
    #[error("Senha inválida!")]
    PasswordInvalid,

    /// The referenced category does not exist for the calling user.
    #[error("Categoria não encontrada.")]
    CategoryNotFound,

    /// The category cannot be deleted because incomes reference it.
    #[error("Categoria possui receitas relacionadas.")]
    CategoryHasIncomes,

    /// The category cannot be deleted because expenses reference it.
    #[error("Categoria possui despesas relacionadas.")]
    CategoryHasExpenses,

    /// The income does not exist for the calling user.
    #[error("Receita não encontrada.")]
    IncomeNotFound,

    /// The expense does not exist for the calling user.
    #[error("Despesa não encontrada.")]
    ExpenseNotFound,

    /// No date was supplied for a transaction.
    #[error("Data é obrigatória!")]
    DateRequired,

    /// No amount was supplied for a transaction.
    ///
    /// A zero amount is indistinguishable from a missing one under this
    /// policy and is also rejected.
    #[error("Valor é obrigatório!")]
    AmountRequired,

    /// No start date was supplied for a dashboard query.
    #[error("Data de início é obrigatória.")]
    StartDateRequired,

    /// No end date was supplied for a dashboard query.
    #[error("Data de fim é obrigatória.")]
    EndDateRequired,

    /// A path parameter is not a 24-character hexadecimal identifier.
    #[error("Identificador inválido.")]
    InvalidId,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An unexpected error occurred with the underlying hashing library.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A bearer token could not be created.
    #[error("token creation failed")]
    TokenCreation,
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<RecordIdError> for Error {
    fn from(_: RecordIdError) -> Self {
        Error::InvalidId
    }
}

impl From<EmailAddressError> for Error {
    fn from(_: EmailAddressError) -> Self {
        Error::EmailInvalid
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(error: bcrypt::BcryptError) -> Self {
        Error::HashingError(error.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::SqlError(_) | Error::HashingError(_) | Error::TokenCreation => {
                tracing::error!("An unexpected error occurred: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
