//! Keeps categories and the transactions that reference them consistent.
//!
//! Transactions carry a denormalized copy of their category's name so that
//! dashboard reads never need a join. The price is paid here: every category
//! reference is validated at transaction write time, a category cannot be
//! deleted while an income or expense still references it, and renaming a
//! category immediately rewrites the name copy on every referencing
//! transaction of both kinds.

use crate::{
    models::{Category, RecordId},
    stores::{CategoryStore, TransactionStore},
    Error,
};

/// A resolved category reference, ready to be embedded into a transaction
/// record.
///
/// Both fields are the empty string when the transaction has no category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryReference {
    pub id: String,
    pub name: String,
}

impl CategoryReference {
    /// The sentinel reference for a transaction without a category.
    pub fn none() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
        }
    }
}

/// Mediates every interaction between the category store and the two
/// transaction stores.
#[derive(Clone)]
pub struct Ledger {
    categories: CategoryStore,
    incomes: TransactionStore,
    expenses: TransactionStore,
}

impl Ledger {
    /// Create a ledger over the category store and both transaction stores.
    pub fn new(
        categories: CategoryStore,
        incomes: TransactionStore,
        expenses: TransactionStore,
    ) -> Self {
        Self {
            categories,
            incomes,
            expenses,
        }
    }

    /// Resolve the category reference for a transaction write.
    ///
    /// An absent or empty `category_id` resolves to the sentinel reference.
    /// Otherwise the category is looked up scoped to `user_id` and its id and
    /// name are returned for embedding into the transaction record.
    ///
    /// # Errors
    /// Returns [Error::CategoryNotFound] if a non-empty `category_id` does
    /// not match a category owned by `user_id`.
    pub fn resolve_reference(
        &self,
        user_id: &RecordId,
        category_id: Option<&str>,
    ) -> Result<CategoryReference, Error> {
        let category_id = match category_id {
            None | Some("") => return Ok(CategoryReference::none()),
            Some(category_id) => category_id,
        };

        match self.categories.get(user_id, category_id)? {
            Some(category) => Ok(CategoryReference {
                id: category.id.as_ref().to_string(),
                name: category.name,
            }),
            None => Err(Error::CategoryNotFound),
        }
    }

    /// Delete a category, returning its prior state.
    ///
    /// # Errors
    /// Returns [Error::CategoryNotFound] if the category does not exist for
    /// `user_id`, [Error::CategoryHasIncomes] if any income of the same user
    /// references it, and [Error::CategoryHasExpenses] if any expense does.
    /// Incomes are checked first.
    pub fn delete_category(
        &self,
        user_id: &RecordId,
        category_id: &str,
    ) -> Result<Category, Error> {
        let category = self
            .categories
            .get(user_id, category_id)?
            .ok_or(Error::CategoryNotFound)?;

        if self.incomes.references_category(user_id, category_id)? {
            return Err(Error::CategoryHasIncomes);
        }

        if self.expenses.references_category(user_id, category_id)? {
            return Err(Error::CategoryHasExpenses);
        }

        self.categories.delete(user_id, category_id)?;

        Ok(category)
    }

    /// Replace a category's name and description, cascading the new name into
    /// the denormalized copies on every referencing income and expense.
    ///
    /// The cascade runs before this function returns: once it succeeds, no
    /// transaction of either kind reports the old name. The two cascade
    /// writes are sequential (incomes first) and are not atomic as a pair; if
    /// the expense update fails the error propagates and the store is left
    /// partially renamed until a later successful rename.
    ///
    /// # Errors
    /// Returns [Error::CategoryNotFound] if the category does not exist for
    /// `user_id` and [Error::NameRequired] if `name` is absent or empty.
    pub fn update_category(
        &self,
        user_id: &RecordId,
        category_id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Category, Error> {
        let mut category = self
            .categories
            .get(user_id, category_id)?
            .ok_or(Error::CategoryNotFound)?;

        let name = name.unwrap_or_default();
        if name.is_empty() {
            return Err(Error::NameRequired);
        }

        category.name = name;
        category.description = description.unwrap_or_default();
        self.categories.update(&category)?;

        self.incomes
            .set_category_name(user_id, category_id, &category.name)?;
        self.expenses
            .set_category_name(user_id, category_id, &category.name)?;

        Ok(category)
    }
}

#[cfg(test)]
mod ledger_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        db::initialize,
        models::{Category, RecordId, TransactionKind},
        stores::{transaction::NewTransaction, CategoryStore, TransactionStore},
        Error,
    };

    use super::{CategoryReference, Ledger};

    fn get_test_ledger() -> Ledger {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        Ledger::new(
            CategoryStore::new(connection.clone()),
            TransactionStore::new(connection.clone(), TransactionKind::Income),
            TransactionStore::new(connection, TransactionKind::Expense),
        )
    }

    fn create_category(ledger: &Ledger, user_id: &RecordId, name: &str) -> Category {
        ledger
            .categories
            .create(user_id, name.to_string(), String::new())
            .unwrap()
    }

    fn create_referencing_transaction(
        store: &TransactionStore,
        user_id: &RecordId,
        category: &Category,
    ) -> crate::models::Transaction {
        store
            .create(
                user_id,
                NewTransaction {
                    date: "2024-01-01".to_string(),
                    amount: 10.0,
                    description: String::new(),
                    category_id: category.id.as_ref().to_string(),
                    category_name: category.name.clone(),
                },
            )
            .unwrap()
    }

    #[test]
    fn resolve_reference_without_category_returns_sentinel() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();

        assert_eq!(
            ledger.resolve_reference(&user_id, None).unwrap(),
            CategoryReference::none()
        );
        assert_eq!(
            ledger.resolve_reference(&user_id, Some("")).unwrap(),
            CategoryReference::none()
        );
    }

    #[test]
    fn resolve_reference_embeds_id_and_name() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();
        let category = create_category(&ledger, &user_id, "Mercado");

        let reference = ledger
            .resolve_reference(&user_id, Some(category.id.as_ref()))
            .unwrap();

        assert_eq!(reference.id, category.id.as_ref());
        assert_eq!(reference.name, "Mercado");
    }

    #[test]
    fn resolve_reference_fails_on_unknown_category() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();

        let result = ledger.resolve_reference(&user_id, Some(RecordId::generate().as_ref()));

        assert_eq!(result, Err(Error::CategoryNotFound));
    }

    #[test]
    fn resolve_reference_fails_on_another_users_category() {
        let ledger = get_test_ledger();
        let owner = RecordId::generate();
        let category = create_category(&ledger, &owner, "Mercado");

        let other_user = RecordId::generate();
        let result = ledger.resolve_reference(&other_user, Some(category.id.as_ref()));

        assert_eq!(result, Err(Error::CategoryNotFound));
    }

    #[test]
    fn delete_unreferenced_category_succeeds() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();
        let category = create_category(&ledger, &user_id, "Mercado");

        let deleted = ledger
            .delete_category(&user_id, category.id.as_ref())
            .unwrap();

        assert_eq!(deleted, category);
        assert_eq!(
            ledger.categories.get(&user_id, category.id.as_ref()).unwrap(),
            None
        );
    }

    #[test]
    fn delete_unknown_category_fails() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();

        let result = ledger.delete_category(&user_id, RecordId::generate().as_ref());

        assert_eq!(result, Err(Error::CategoryNotFound));
    }

    #[test]
    fn delete_category_with_income_fails() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();
        let category = create_category(&ledger, &user_id, "Salário");
        create_referencing_transaction(&ledger.incomes, &user_id, &category);

        let result = ledger.delete_category(&user_id, category.id.as_ref());

        assert_eq!(result, Err(Error::CategoryHasIncomes));
    }

    #[test]
    fn delete_category_with_expense_fails() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();
        let category = create_category(&ledger, &user_id, "Mercado");
        create_referencing_transaction(&ledger.expenses, &user_id, &category);

        let result = ledger.delete_category(&user_id, category.id.as_ref());

        assert_eq!(result, Err(Error::CategoryHasExpenses));
    }

    #[test]
    fn delete_category_with_both_kinds_reports_incomes() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();
        let category = create_category(&ledger, &user_id, "Mercado");
        create_referencing_transaction(&ledger.incomes, &user_id, &category);
        create_referencing_transaction(&ledger.expenses, &user_id, &category);

        let result = ledger.delete_category(&user_id, category.id.as_ref());

        assert_eq!(result, Err(Error::CategoryHasIncomes));
    }

    #[test]
    fn delete_category_ignores_other_users_references() {
        let ledger = get_test_ledger();
        let owner = RecordId::generate();
        let category = create_category(&ledger, &owner, "Mercado");

        // Another user with a transaction pointing at the same id string must
        // not block the owner's delete.
        let other_user = RecordId::generate();
        create_referencing_transaction(&ledger.expenses, &other_user, &category);

        let result = ledger.delete_category(&owner, category.id.as_ref());

        assert_eq!(result, Ok(category));
    }

    #[test]
    fn update_category_cascades_into_both_kinds() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();
        let category = create_category(&ledger, &user_id, "Mercado");
        let income = create_referencing_transaction(&ledger.incomes, &user_id, &category);
        let expense = create_referencing_transaction(&ledger.expenses, &user_id, &category);

        let updated = ledger
            .update_category(
                &user_id,
                category.id.as_ref(),
                Some("Supermercado".to_string()),
                Some("Compras do mês".to_string()),
            )
            .unwrap();

        assert_eq!(updated.name, "Supermercado");
        assert_eq!(updated.description, "Compras do mês");

        let income = ledger.incomes.get(&user_id, income.id.as_ref()).unwrap().unwrap();
        assert_eq!(income.category_name, "Supermercado");

        let expense = ledger
            .expenses
            .get(&user_id, expense.id.as_ref())
            .unwrap()
            .unwrap();
        assert_eq!(expense.category_name, "Supermercado");
    }

    #[test]
    fn update_category_leaves_other_categories_alone() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();
        let renamed = create_category(&ledger, &user_id, "Mercado");
        let untouched = create_category(&ledger, &user_id, "Transporte");
        let unrelated = create_referencing_transaction(&ledger.expenses, &user_id, &untouched);

        ledger
            .update_category(
                &user_id,
                renamed.id.as_ref(),
                Some("Supermercado".to_string()),
                None,
            )
            .unwrap();

        let unrelated = ledger
            .expenses
            .get(&user_id, unrelated.id.as_ref())
            .unwrap()
            .unwrap();
        assert_eq!(unrelated.category_name, "Transporte");
    }

    #[test]
    fn update_category_fails_on_empty_name() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();
        let category = create_category(&ledger, &user_id, "Mercado");

        let result =
            ledger.update_category(&user_id, category.id.as_ref(), Some(String::new()), None);
        assert_eq!(result, Err(Error::NameRequired));

        let result = ledger.update_category(&user_id, category.id.as_ref(), None, None);
        assert_eq!(result, Err(Error::NameRequired));
    }

    #[test]
    fn update_unknown_category_fails() {
        let ledger = get_test_ledger();
        let user_id = RecordId::generate();

        let result = ledger.update_category(
            &user_id,
            RecordId::generate().as_ref(),
            Some("Mercado".to_string()),
            None,
        );

        assert_eq!(result, Err(Error::CategoryNotFound));
    }
}
