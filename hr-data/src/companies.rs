use dashmap::DashMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::Company;
use crate::error::{DataError, SqlxErrorExt};

/// `get_or_create_company` is idempotent on `mandate_path`, with an
/// in-process `mandate_path -> company_id` shortcut cache in front of it —
/// grounded on `neon_hr_manager.py`'s module-level `_company_cache` dict.
/// Like the mandate resolver's cache, this is a performance shortcut only.
pub struct CompanyRepository {
    pool: PgPool,
    cache: DashMap<String, Uuid>,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: DashMap::new(),
        }
    }

    pub async fn company_id_from_mandate_path(&self, mandate_path: &str) -> Result<Option<Uuid>, DataError> {
        if let Some(id) = self.cache.get(mandate_path) {
            return Ok(Some(*id));
        }

        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM core.companies WHERE firebase_mandate_path = $1")
            .bind(mandate_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;

        if let Some((id,)) = row {
            self.cache.insert(mandate_path.to_string(), id);
            return Ok(Some(id));
        }
        Ok(None)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn get_or_create_company(
        &self,
        account_firebase_uid: &str,
        mandate_path: &str,
        company_name: &str,
        country: &str,
        country_code: Option<&str>,
        region: Option<&str>,
        region_code: Option<&str>,
    ) -> Result<Uuid, DataError> {
        if let Some(existing) = self.company_id_from_mandate_path(mandate_path).await? {
            return Ok(existing);
        }

        let mut tx = self.pool.begin().await.map_err(|e| e.into_data_error())?;

        let account: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM core.accounts WHERE firebase_uid = $1")
            .bind(account_firebase_uid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| e.into_data_error())?;

        let account_id = match account {
            Some((id,)) => id,
            None => {
                let (id,): (Uuid,) = sqlx::query_as(
                    "INSERT INTO core.accounts (firebase_uid, display_name, email) VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(account_firebase_uid)
                .bind("Imported Account")
                .bind(format!("{account_firebase_uid}@imported.local"))
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| e.into_data_error())?;
                id
            }
        };

        let parts: Vec<&str> = mandate_path.split('/').collect();
        let firebase_parent_id = parts.get(1).copied();
        let firebase_mandate_id = parts.get(3).copied();

        let (company_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO core.companies (
                account_id, firebase_mandate_path, firebase_mandate_id,
                firebase_parent_id, name, country, country_code, region, region_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(mandate_path)
        .bind(firebase_mandate_id)
        .bind(firebase_parent_id)
        .bind(company_name)
        .bind(country)
        .bind(country_code)
        .bind(region)
        .bind(region_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.into_data_error())?;

        tx.commit().await.map_err(|e| e.into_data_error())?;

        self.cache.insert(mandate_path.to_string(), company_id);
        tracing::info!(company_id = %company_id, name = company_name, "company created");
        Ok(company_id)
    }

    pub async fn get(&self, company_id: Uuid) -> Result<Option<Company>, DataError> {
        sqlx::query_as::<_, Company>("SELECT * FROM core.companies WHERE id = $1")
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_data_error())
    }
}
