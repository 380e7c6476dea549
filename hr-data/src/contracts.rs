use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{Contract, NewContract};
use crate::error::{DataError, SqlxErrorExt};

pub struct ContractRepository {
    pool: PgPool,
}

impl ContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, company_id: Uuid, employee_id: Uuid) -> Result<Vec<Contract>, DataError> {
        sqlx::query_as::<_, Contract>(
            r#"
            SELECT c.id, c.employee_id, c.contract_type, c.start_date, c.end_date,
                   c.base_salary, c.currency, c.work_rate, c.weekly_hours, c.is_active
            FROM hr.contracts c
            JOIN hr.employees e ON c.employee_id = e.id
            WHERE c.employee_id = $1 AND e.company_id = $2
            ORDER BY c.start_date DESC
            "#,
        )
        .bind(employee_id)
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.into_data_error())
    }

    /// `is_active=true ∧ start_date ≤ today ∧ (end_date is null ∨ end_date ≥
    /// today)`, tie-break by latest `start_date`.
    pub async fn get_active(&self, company_id: Uuid, employee_id: Uuid) -> Result<Option<Contract>, DataError> {
        sqlx::query_as::<_, Contract>(
            r#"
            SELECT c.* FROM hr.contracts c
            JOIN hr.employees e ON c.employee_id = e.id
            WHERE c.employee_id = $1
              AND e.company_id = $2
              AND c.is_active = TRUE
              AND c.start_date <= CURRENT_DATE
              AND (c.end_date IS NULL OR c.end_date >= CURRENT_DATE)
            ORDER BY c.start_date DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_data_error())
    }

    pub async fn create(&self, company_id: Uuid, employee_id: Uuid, new: NewContract) -> Result<Uuid, DataError> {
        let belongs: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM hr.employees WHERE id = $1 AND company_id = $2")
            .bind(employee_id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        if belongs.is_none() {
            return Err(DataError::NotFound(format!("employee {employee_id} not found in company {company_id}")));
        }

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO hr.contracts (
                employee_id, contract_type, start_date, end_date,
                base_salary, currency, work_rate, weekly_hours
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(employee_id)
        .bind(&new.contract_type)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.base_salary)
        .bind(&new.currency)
        .bind(new.work_rate)
        .bind(new.weekly_hours)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.into_data_error())?;

        tracing::info!(contract_id = %id, employee_id = %employee_id, "contract created");
        Ok(id)
    }
}
