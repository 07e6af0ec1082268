//! The route paths served by the API.

pub const ROOT: &str = "/";

pub const REGISTER: &str = "/users/register";
pub const LOG_IN: &str = "/users/login";

pub const CATEGORIES: &str = "/categories";
pub const CATEGORY: &str = "/categories/:category_id";

pub const INCOMES: &str = "/incomes";
pub const INCOME: &str = "/incomes/:transaction_id";

pub const EXPENSES: &str = "/expenses";
pub const EXPENSE: &str = "/expenses/:transaction_id";

pub const DASHBOARD_TOTALS: &str = "/dashboard/totals";
pub const DASHBOARD_EVOLUTION: &str = "/dashboard/evolution";
pub const DASHBOARD_EXPENSES_BY_CATEGORY: &str = "/dashboard/expenses-by-category";
pub const DASHBOARD_INCOMES_BY_CATEGORY: &str = "/dashboard/incomes-by-category";
