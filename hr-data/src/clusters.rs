use sqlx::PgPool;

use crate::entities::Cluster;
use crate::error::{DataError, SqlxErrorExt};

pub struct ClusterRepository {
    pool: PgPool,
}

impl ClusterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, country_code: Option<&str>) -> Result<Vec<Cluster>, DataError> {
        match country_code {
            Some(code) => sqlx::query_as::<_, Cluster>(
                r#"
                SELECT c.* FROM hr.clusters c
                JOIN hr.country_clusters cc ON c.code = cc.cluster_code
                WHERE cc.country_code = $1 AND c.is_active = TRUE
                ORDER BY c.code
                "#,
            )
            .bind(code)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_data_error()),
            None => sqlx::query_as::<_, Cluster>("SELECT * FROM hr.clusters WHERE is_active = TRUE ORDER BY code")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.into_data_error()),
        }
    }
}
