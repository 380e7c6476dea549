use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Created on first HR access for a given mandate, never deleted.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Company {
    pub id: Uuid,
    pub account_id: Uuid,
    pub firebase_mandate_path: String,
    pub name: String,
    pub country: String,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Employee {
    pub id: Uuid,
    pub company_id: Uuid,
    pub identifier: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub cluster_code: String,
    pub hire_date: NaiveDate,
    pub is_active: bool,
}

/// Input for `EmployeeRepository::create` — a fresh record always starts
/// active, so `is_active` isn't part of creation.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub identifier: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub cluster_code: String,
    pub hire_date: NaiveDate,
}

/// Dynamic-column update restricted to a fixed whitelist of fields.
/// Every field left `None` is left untouched; an all-`None` patch is a
/// no-op returning `false`, never an error.
#[derive(Debug, Clone, Default)]
pub struct EmployeePatch {
    pub identifier: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub cluster_code: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Contract {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub contract_type: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub base_salary: Decimal,
    pub currency: String,
    pub work_rate: Decimal,
    pub weekly_hours: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewContract {
    pub contract_type: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub base_salary: Decimal,
    pub currency: String,
    pub work_rate: Decimal,
    pub weekly_hours: Decimal,
}

impl Default for NewContract {
    fn default() -> Self {
        Self {
            contract_type: String::new(),
            start_date: NaiveDate::default(),
            end_date: None,
            base_salary: Decimal::ZERO,
            currency: "CHF".to_string(),
            work_rate: Decimal::ONE,
            weekly_hours: Decimal::from(42),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Cluster {
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct PayrollResult {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub period_year: i32,
    pub period_month: i32,
    pub gross_amount: Option<Decimal>,
    pub net_amount: Option<Decimal>,
}
