use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::PayrollResult;
use crate::error::{DataError, SqlxErrorExt};

/// Read-only from this system's point of view — results are written by the
/// Jobber once a payroll calculation completes.
pub struct PayrollRepository {
    pool: PgPool,
}

impl PayrollRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, company_id: Uuid, employee_id: Uuid, year: i32, month: i32) -> Result<Option<PayrollResult>, DataError> {
        sqlx::query_as::<_, PayrollResult>(
            r#"
            SELECT r.* FROM hr.payroll_results r
            JOIN hr.employees e ON r.employee_id = e.id
            WHERE r.employee_id = $1 AND r.period_year = $2 AND r.period_month = $3 AND e.company_id = $4
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .bind(month)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_data_error())
    }

    pub async fn list(&self, company_id: Uuid, employee_id: Option<Uuid>, year: Option<i32>) -> Result<Vec<PayrollResult>, DataError> {
        let mut sql = String::from(
            "SELECT r.* FROM hr.payroll_results r JOIN hr.employees e ON r.employee_id = e.id WHERE e.company_id = $1",
        );
        let mut idx = 2;
        if employee_id.is_some() {
            sql.push_str(&format!(" AND r.employee_id = ${idx}"));
            idx += 1;
        }
        if year.is_some() {
            sql.push_str(&format!(" AND r.period_year = ${idx}"));
        }
        sql.push_str(" ORDER BY r.period_year DESC, r.period_month DESC");

        let mut query = sqlx::query_as::<_, PayrollResult>(&sql).bind(company_id);
        if let Some(id) = employee_id {
            query = query.bind(id);
        }
        if let Some(y) = year {
            query = query.bind(y);
        }

        query.fetch_all(&self.pool).await.map_err(|e| e.into_data_error())
    }
}
