//! The API routes for categories, incomes, expenses and the dashboard.
//!
//! Incomes and expenses share one set of handler bodies parameterized by
//! [TransactionKind]; the thin per-kind wrappers exist so each route has a
//! concrete handler function. Owners are always taken from the verified
//! [Claims], never from client input.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::{
    auth::{self, Claims},
    dashboard, endpoints,
    models::{RecordId, Transaction, TransactionKind},
    stores::transaction::NewTransaction,
    AppState, Error,
};

/// Return a router with all the app's routes.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route(endpoints::ROOT, get(|| async { StatusCode::OK }))
        .route(endpoints::REGISTER, post(auth::register))
        .route(endpoints::LOG_IN, post(auth::log_in))
        .route(
            endpoints::CATEGORIES,
            get(list_categories).post(create_category),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route(endpoints::INCOMES, get(list_incomes).post(create_income))
        .route(
            endpoints::INCOME,
            get(get_income).put(update_income).delete(delete_income),
        )
        .route(endpoints::EXPENSES, get(list_expenses).post(create_expense))
        .route(
            endpoints::EXPENSE,
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route(endpoints::DASHBOARD_TOTALS, post(dashboard::get_totals))
        .route(
            endpoints::DASHBOARD_EVOLUTION,
            post(dashboard::get_evolution),
        )
        .route(
            endpoints::DASHBOARD_EXPENSES_BY_CATEGORY,
            post(dashboard::get_expenses_by_category),
        )
        .route(
            endpoints::DASHBOARD_INCOMES_BY_CATEGORY,
            post(dashboard::get_incomes_by_category),
        )
}

/// The payload for creating or replacing a category.
#[derive(Debug, serde::Deserialize)]
pub struct CategoryData {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A route handler for listing the caller's categories.
async fn list_categories(State(state): State<AppState>, claims: Claims) -> Result<Response, Error> {
    let categories = state.categories().get_all(&claims.id)?;

    Ok((StatusCode::OK, Json(categories)).into_response())
}

/// A route handler for creating a new category.
async fn create_category(
    State(state): State<AppState>,
    claims: Claims,
    Json(data): Json<CategoryData>,
) -> Result<Response, Error> {
    let name = data.name.unwrap_or_default();
    if name.is_empty() {
        return Err(Error::NameRequired);
    }

    let category =
        state
            .categories()
            .create(&claims.id, name, data.description.unwrap_or_default())?;

    Ok((StatusCode::CREATED, Json(category)).into_response())
}

/// A route handler for getting a category by its ID.
async fn get_category(
    State(state): State<AppState>,
    claims: Claims,
    Path(category_id): Path<String>,
) -> Result<Response, Error> {
    let category_id = RecordId::parse(&category_id)?;

    let category = state
        .categories()
        .get(&claims.id, category_id.as_ref())?
        .ok_or(Error::CategoryNotFound)?;

    Ok((StatusCode::OK, Json(category)).into_response())
}

/// A route handler for replacing a category's name and description.
///
/// Routed through the ledger so the rename cascade runs before the response
/// is sent.
async fn update_category(
    State(state): State<AppState>,
    claims: Claims,
    Path(category_id): Path<String>,
    Json(data): Json<CategoryData>,
) -> Result<Response, Error> {
    let category_id = RecordId::parse(&category_id)?;

    let category = state.ledger().update_category(
        &claims.id,
        category_id.as_ref(),
        data.name,
        data.description,
    )?;

    Ok((StatusCode::OK, Json(category)).into_response())
}

/// A route handler for deleting a category, returning its prior state.
///
/// Routed through the ledger, which refuses while any income or expense
/// still references the category.
async fn delete_category(
    State(state): State<AppState>,
    claims: Claims,
    Path(category_id): Path<String>,
) -> Result<Response, Error> {
    let category_id = RecordId::parse(&category_id)?;

    let category = state
        .ledger()
        .delete_category(&claims.id, category_id.as_ref())?;

    Ok((StatusCode::OK, Json(category)).into_response())
}

/// The payload for creating or replacing a transaction.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub date: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub category_id: Option<String>,
}

impl TransactionData {
    /// Unpack the required fields.
    ///
    /// # Errors
    /// Returns [Error::DateRequired] if the date is absent or empty, and
    /// [Error::AmountRequired] if the amount is absent or zero. A zero
    /// amount is indistinguishable from a missing one and is rejected.
    fn validated(&self) -> Result<(String, f64, String), Error> {
        let date = self.date.clone().unwrap_or_default();
        if date.is_empty() {
            return Err(Error::DateRequired);
        }

        let amount = self.amount.unwrap_or(0.0);
        if amount == 0.0 {
            return Err(Error::AmountRequired);
        }

        Ok((date, amount, self.description.clone().unwrap_or_default()))
    }
}

async fn list_transactions(
    state: AppState,
    claims: Claims,
    kind: TransactionKind,
) -> Result<Response, Error> {
    let transactions = state.transactions(kind).get_all(&claims.id)?;

    Ok((StatusCode::OK, Json(transactions)).into_response())
}

async fn get_transaction(
    state: AppState,
    claims: Claims,
    kind: TransactionKind,
    transaction_id: String,
) -> Result<Response, Error> {
    let transaction_id = RecordId::parse(&transaction_id)?;

    let store = state.transactions(kind);
    let transaction = store
        .get(&claims.id, transaction_id.as_ref())?
        .ok_or_else(|| store.not_found())?;

    Ok((StatusCode::OK, Json(transaction)).into_response())
}

async fn create_transaction(
    state: AppState,
    claims: Claims,
    kind: TransactionKind,
    data: TransactionData,
) -> Result<Response, Error> {
    let (date, amount, description) = data.validated()?;

    let reference = state
        .ledger()
        .resolve_reference(&claims.id, data.category_id.as_deref())?;

    let transaction = state.transactions(kind).create(
        &claims.id,
        NewTransaction {
            date,
            amount,
            description,
            category_id: reference.id,
            category_name: reference.name,
        },
    )?;

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

async fn update_transaction(
    state: AppState,
    claims: Claims,
    kind: TransactionKind,
    transaction_id: String,
    data: TransactionData,
) -> Result<Response, Error> {
    let transaction_id = RecordId::parse(&transaction_id)?;

    let store = state.transactions(kind);
    let existing = store
        .get(&claims.id, transaction_id.as_ref())?
        .ok_or_else(|| store.not_found())?;

    let (date, amount, description) = data.validated()?;

    // The reference is re-resolved even when unchanged, so a stale name copy
    // gets refreshed by any full update.
    let reference = state
        .ledger()
        .resolve_reference(&claims.id, data.category_id.as_deref())?;

    let transaction = Transaction {
        id: existing.id,
        date,
        amount,
        description,
        category_id: reference.id,
        category_name: reference.name,
        user_id: existing.user_id,
    };
    store.update(&transaction)?;

    Ok((StatusCode::OK, Json(transaction)).into_response())
}

async fn delete_transaction(
    state: AppState,
    claims: Claims,
    kind: TransactionKind,
    transaction_id: String,
) -> Result<Response, Error> {
    let transaction_id = RecordId::parse(&transaction_id)?;

    let store = state.transactions(kind);
    let transaction = store
        .get(&claims.id, transaction_id.as_ref())?
        .ok_or_else(|| store.not_found())?;

    store.delete(&claims.id, transaction_id.as_ref())?;

    Ok((StatusCode::OK, Json(transaction)).into_response())
}

async fn list_incomes(State(state): State<AppState>, claims: Claims) -> Result<Response, Error> {
    list_transactions(state, claims, TransactionKind::Income).await
}

async fn create_income(
    State(state): State<AppState>,
    claims: Claims,
    Json(data): Json<TransactionData>,
) -> Result<Response, Error> {
    create_transaction(state, claims, TransactionKind::Income, data).await
}

async fn get_income(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<String>,
) -> Result<Response, Error> {
    get_transaction(state, claims, TransactionKind::Income, transaction_id).await
}

async fn update_income(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<String>,
    Json(data): Json<TransactionData>,
) -> Result<Response, Error> {
    update_transaction(state, claims, TransactionKind::Income, transaction_id, data).await
}

async fn delete_income(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<String>,
) -> Result<Response, Error> {
    delete_transaction(state, claims, TransactionKind::Income, transaction_id).await
}

async fn list_expenses(State(state): State<AppState>, claims: Claims) -> Result<Response, Error> {
    list_transactions(state, claims, TransactionKind::Expense).await
}

async fn create_expense(
    State(state): State<AppState>,
    claims: Claims,
    Json(data): Json<TransactionData>,
) -> Result<Response, Error> {
    create_transaction(state, claims, TransactionKind::Expense, data).await
}

async fn get_expense(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<String>,
) -> Result<Response, Error> {
    get_transaction(state, claims, TransactionKind::Expense, transaction_id).await
}

async fn update_expense(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<String>,
    Json(data): Json<TransactionData>,
) -> Result<Response, Error> {
    update_transaction(state, claims, TransactionKind::Expense, transaction_id, data).await
}

async fn delete_expense(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<String>,
) -> Result<Response, Error> {
    delete_transaction(state, claims, TransactionKind::Expense, transaction_id).await
}
