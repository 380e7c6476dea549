use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{Employee, EmployeePatch, NewEmployee};
use crate::error::{DataError, SqlxErrorExt};

pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, company_id: Uuid) -> Result<Vec<Employee>, DataError> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, identifier, first_name, last_name, birth_date,
                   cluster_code, hire_date, is_active, company_id
            FROM hr.employees
            WHERE company_id = $1 AND is_active = TRUE
            ORDER BY last_name, first_name
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.into_data_error())
    }

    pub async fn get(&self, company_id: Uuid, employee_id: Uuid) -> Result<Option<Employee>, DataError> {
        sqlx::query_as::<_, Employee>("SELECT * FROM hr.employees WHERE id = $1 AND company_id = $2")
            .bind(employee_id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_data_error())
    }

    pub async fn create(&self, company_id: Uuid, new: NewEmployee) -> Result<Uuid, DataError> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO hr.employees (
                company_id, identifier, first_name, last_name,
                birth_date, cluster_code, hire_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(company_id)
        .bind(&new.identifier)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(new.birth_date)
        .bind(&new.cluster_code)
        .bind(new.hire_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.into_data_error())?;

        tracing::info!(employee_id = %id, "employee created");
        Ok(id)
    }

    /// Dynamic column set, restricted to the whitelist baked into
    /// `EmployeePatch`'s fields. An all-`None` patch is a no-op returning
    /// `false`, not an error.
    pub async fn update(&self, company_id: Uuid, employee_id: Uuid, patch: EmployeePatch) -> Result<bool, DataError> {
        let mut set_clauses: Vec<String> = Vec::new();
        let mut idx = 1;
        macro_rules! push_clause {
            ($field:literal) => {{
                set_clauses.push(format!("{} = ${}", $field, idx));
                idx += 1;
            }};
        }

        if patch.identifier.is_some() {
            push_clause!("identifier");
        }
        if patch.first_name.is_some() {
            push_clause!("first_name");
        }
        if patch.last_name.is_some() {
            push_clause!("last_name");
        }
        if patch.birth_date.is_some() {
            push_clause!("birth_date");
        }
        if patch.cluster_code.is_some() {
            push_clause!("cluster_code");
        }
        if patch.hire_date.is_some() {
            push_clause!("hire_date");
        }
        if patch.is_active.is_some() {
            push_clause!("is_active");
        }

        if set_clauses.is_empty() {
            return Ok(false);
        }

        let sql = format!(
            "UPDATE hr.employees SET {}, updated_at = NOW() WHERE id = ${} AND company_id = ${}",
            set_clauses.join(", "),
            idx,
            idx + 1
        );

        let mut query = sqlx::query(&sql);
        if let Some(v) = patch.identifier {
            query = query.bind(v);
        }
        if let Some(v) = patch.first_name {
            query = query.bind(v);
        }
        if let Some(v) = patch.last_name {
            query = query.bind(v);
        }
        if let Some(v) = patch.birth_date {
            query = query.bind(v);
        }
        if let Some(v) = patch.cluster_code {
            query = query.bind(v);
        }
        if let Some(v) = patch.hire_date {
            query = query.bind(v);
        }
        if let Some(v) = patch.is_active {
            query = query.bind(v);
        }
        query = query.bind(employee_id).bind(company_id);

        let result = query.execute(&self.pool).await.map_err(|e| e.into_data_error())?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(&self, company_id: Uuid, employee_id: Uuid) -> Result<bool, DataError> {
        let result = sqlx::query("UPDATE hr.employees SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND company_id = $2")
            .bind(employee_id)
            .bind(company_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(result.rows_affected() == 1)
    }
}
