//! Read-side aggregations over date-filtered transactions.
//!
//! Every query takes an inclusive `[startDate, endDate]` range and never
//! joins against the category table: grouping uses the denormalized
//! `category_name` kept consistent by [crate::ledger].

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::Claims,
    models::{RecordId, Transaction, TransactionKind},
    stores::TransactionStore,
    AppState, Error,
};

/// The label for the synthetic group holding uncategorized transactions.
pub const UNCATEGORIZED_GROUP: &str = "Não informada";

/// One aggregated value in a chart, e.g. a pie slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub group: String,
    pub value: f64,
}

/// One unaggregated point in a time series chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub group: String,
    pub date: String,
    pub value: f64,
}

/// The date range payload shared by all dashboard queries.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRange {
    /// Unpack the range, requiring both bounds.
    ///
    /// # Errors
    /// Returns [Error::StartDateRequired] or [Error::EndDateRequired] if the
    /// corresponding bound is absent or empty. The start date is checked
    /// first.
    fn validated(self) -> Result<(String, String), Error> {
        let start_date = self.start_date.unwrap_or_default();
        if start_date.is_empty() {
            return Err(Error::StartDateRequired);
        }

        let end_date = self.end_date.unwrap_or_default();
        if end_date.is_empty() {
            return Err(Error::EndDateRequired);
        }

        Ok((start_date, end_date))
    }
}

fn sum(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(|transaction| transaction.amount).sum()
}

/// The total expense and income amounts in the range, as two labeled groups
/// (expenses first).
pub fn totals(
    incomes: &TransactionStore,
    expenses: &TransactionStore,
    user_id: &RecordId,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<ChartData>, Error> {
    let expense_total = sum(&expenses.get_in_range(user_id, start_date, end_date)?);
    let income_total = sum(&incomes.get_in_range(user_id, start_date, end_date)?);

    Ok(vec![
        ChartData {
            group: TransactionKind::Expense.chart_group().to_string(),
            value: expense_total,
        },
        ChartData {
            group: TransactionKind::Income.chart_group().to_string(),
            value: income_total,
        },
    ])
}

/// Every transaction of both kinds in the range, projected to chart points
/// (expenses first, then incomes, each in store order).
pub fn evolution(
    incomes: &TransactionStore,
    expenses: &TransactionStore,
    user_id: &RecordId,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<ChartPoint>, Error> {
    let mut points = Vec::new();

    for store in [expenses, incomes] {
        let group = store.kind().chart_group();

        points.extend(
            store
                .get_in_range(user_id, start_date, end_date)?
                .into_iter()
                .map(|transaction| ChartPoint {
                    group: group.to_string(),
                    date: transaction.date,
                    value: transaction.amount,
                }),
        );
    }

    Ok(points)
}

/// The transactions of one kind in the range, grouped by category name.
///
/// Groups appear in order of first appearance; transactions without a
/// category are collapsed into a trailing [UNCATEGORIZED_GROUP] entry. The
/// synthetic group is only present when at least one transaction matched the
/// range (even if its own sum is zero); an empty match yields an empty result.
pub fn by_category(
    store: &TransactionStore,
    user_id: &RecordId,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<ChartData>, Error> {
    let transactions = store.get_in_range(user_id, start_date, end_date)?;

    if transactions.is_empty() {
        return Ok(vec![]);
    }

    let mut groups: Vec<ChartData> = Vec::new();
    let mut uncategorized_total = 0.0;

    for transaction in &transactions {
        if transaction.category_name.is_empty() {
            uncategorized_total += transaction.amount;
            continue;
        }

        match groups
            .iter_mut()
            .find(|chart_data| chart_data.group == transaction.category_name)
        {
            Some(chart_data) => chart_data.value += transaction.amount,
            None => groups.push(ChartData {
                group: transaction.category_name.clone(),
                value: transaction.amount,
            }),
        }
    }

    groups.push(ChartData {
        group: UNCATEGORIZED_GROUP.to_string(),
        value: uncategorized_total,
    });

    Ok(groups)
}

/// A route handler for the expense/income totals chart.
pub async fn get_totals(
    State(state): State<AppState>,
    claims: Claims,
    Json(range): Json<DateRange>,
) -> Result<Response, Error> {
    let (start_date, end_date) = range.validated()?;

    let chart_data = totals(
        &state.incomes(),
        &state.expenses(),
        &claims.id,
        &start_date,
        &end_date,
    )?;

    Ok((StatusCode::OK, Json(chart_data)).into_response())
}

/// A route handler for the transaction evolution chart.
pub async fn get_evolution(
    State(state): State<AppState>,
    claims: Claims,
    Json(range): Json<DateRange>,
) -> Result<Response, Error> {
    let (start_date, end_date) = range.validated()?;

    let chart_points = evolution(
        &state.incomes(),
        &state.expenses(),
        &claims.id,
        &start_date,
        &end_date,
    )?;

    Ok((StatusCode::OK, Json(chart_points)).into_response())
}

/// A route handler for the expenses-by-category chart.
pub async fn get_expenses_by_category(
    State(state): State<AppState>,
    claims: Claims,
    Json(range): Json<DateRange>,
) -> Result<Response, Error> {
    let (start_date, end_date) = range.validated()?;

    let chart_data = by_category(&state.expenses(), &claims.id, &start_date, &end_date)?;

    Ok((StatusCode::OK, Json(chart_data)).into_response())
}

/// A route handler for the incomes-by-category chart.
pub async fn get_incomes_by_category(
    State(state): State<AppState>,
    claims: Claims,
    Json(range): Json<DateRange>,
) -> Result<Response, Error> {
    let (start_date, end_date) = range.validated()?;

    let chart_data = by_category(&state.incomes(), &claims.id, &start_date, &end_date)?;

    Ok((StatusCode::OK, Json(chart_data)).into_response())
}

#[cfg(test)]
mod dashboard_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        db::initialize,
        models::{RecordId, TransactionKind},
        stores::{transaction::NewTransaction, TransactionStore},
        Error,
    };

    use super::{by_category, evolution, totals, ChartData, DateRange, UNCATEGORIZED_GROUP};

    fn get_test_stores() -> (TransactionStore, TransactionStore) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        (
            TransactionStore::new(connection.clone(), TransactionKind::Income),
            TransactionStore::new(connection, TransactionKind::Expense),
        )
    }

    fn transaction(date: &str, amount: f64, category_name: &str) -> NewTransaction {
        NewTransaction {
            date: date.to_string(),
            amount,
            description: String::new(),
            category_id: if category_name.is_empty() {
                String::new()
            } else {
                "aaaaaaaaaaaaaaaaaaaaaaaa".to_string()
            },
            category_name: category_name.to_string(),
        }
    }

    #[test]
    fn date_range_requires_start_then_end() {
        let missing_start = DateRange {
            start_date: None,
            end_date: Some("2024-01-31".to_string()),
        };
        assert_eq!(missing_start.validated(), Err(Error::StartDateRequired));

        let missing_end = DateRange {
            start_date: Some("2024-01-01".to_string()),
            end_date: None,
        };
        assert_eq!(missing_end.validated(), Err(Error::EndDateRequired));

        let missing_both = DateRange {
            start_date: None,
            end_date: None,
        };
        assert_eq!(missing_both.validated(), Err(Error::StartDateRequired));
    }

    #[test]
    fn totals_sums_each_kind() {
        let (incomes, expenses) = get_test_stores();
        let user_id = RecordId::generate();

        incomes.create(&user_id, transaction("2024-01-05", 100.0, "")).unwrap();
        incomes.create(&user_id, transaction("2024-01-10", 50.0, "")).unwrap();
        expenses.create(&user_id, transaction("2024-01-07", 30.0, "")).unwrap();
        // Outside the range, must not count.
        expenses.create(&user_id, transaction("2024-02-07", 99.0, "")).unwrap();

        let chart_data = totals(&incomes, &expenses, &user_id, "2024-01-01", "2024-01-31").unwrap();

        assert_eq!(
            chart_data,
            vec![
                ChartData {
                    group: "Despesas".to_string(),
                    value: 30.0
                },
                ChartData {
                    group: "Receitas".to_string(),
                    value: 150.0
                },
            ]
        );
    }

    #[test]
    fn totals_are_zero_for_empty_range() {
        let (incomes, expenses) = get_test_stores();
        let user_id = RecordId::generate();

        let chart_data = totals(&incomes, &expenses, &user_id, "2024-01-01", "2024-01-31").unwrap();

        assert_eq!(chart_data[0].value, 0.0);
        assert_eq!(chart_data[1].value, 0.0);
    }

    #[test]
    fn evolution_projects_every_matching_transaction() {
        let (incomes, expenses) = get_test_stores();
        let user_id = RecordId::generate();

        incomes.create(&user_id, transaction("2024-01-05", 100.0, "")).unwrap();
        expenses.create(&user_id, transaction("2024-01-07", 30.0, "")).unwrap();
        expenses.create(&user_id, transaction("2024-01-08", 20.0, "")).unwrap();

        let points = evolution(&incomes, &expenses, &user_id, "2024-01-01", "2024-01-31").unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].group, "Despesas");
        assert_eq!(points[0].date, "2024-01-07");
        assert_eq!(points[0].value, 30.0);
        assert_eq!(points[2].group, "Receitas");
        assert_eq!(points[2].value, 100.0);
    }

    #[test]
    fn by_category_groups_and_collapses_uncategorized() {
        let (_, expenses) = get_test_stores();
        let user_id = RecordId::generate();

        expenses.create(&user_id, transaction("2024-01-05", 10.0, "")).unwrap();
        expenses.create(&user_id, transaction("2024-01-07", 20.0, "Food")).unwrap();

        let chart_data = by_category(&expenses, &user_id, "2024-01-01", "2024-01-31").unwrap();

        assert_eq!(
            chart_data,
            vec![
                ChartData {
                    group: "Food".to_string(),
                    value: 20.0
                },
                ChartData {
                    group: UNCATEGORIZED_GROUP.to_string(),
                    value: 10.0
                },
            ]
        );
    }

    #[test]
    fn by_category_sums_within_groups() {
        let (_, expenses) = get_test_stores();
        let user_id = RecordId::generate();

        expenses.create(&user_id, transaction("2024-01-05", 10.0, "Mercado")).unwrap();
        expenses.create(&user_id, transaction("2024-01-07", 20.0, "Mercado")).unwrap();
        expenses.create(&user_id, transaction("2024-01-09", 5.0, "Transporte")).unwrap();

        let chart_data = by_category(&expenses, &user_id, "2024-01-01", "2024-01-31").unwrap();

        assert_eq!(
            chart_data,
            vec![
                ChartData {
                    group: "Mercado".to_string(),
                    value: 30.0
                },
                ChartData {
                    group: "Transporte".to_string(),
                    value: 5.0
                },
                ChartData {
                    group: UNCATEGORIZED_GROUP.to_string(),
                    value: 0.0
                },
            ]
        );
    }

    #[test]
    fn by_category_is_empty_when_nothing_matches() {
        let (_, expenses) = get_test_stores();
        let user_id = RecordId::generate();

        expenses.create(&user_id, transaction("2024-02-05", 10.0, "Mercado")).unwrap();

        let chart_data = by_category(&expenses, &user_id, "2024-01-01", "2024-01-31").unwrap();

        assert_eq!(chart_data, vec![]);
    }
}
