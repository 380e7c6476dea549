//! PostgreSQL-backed HR data access — the one write-enabled data family this
//! system owns.
//!
//! Grounded on `original_source/app/tools/neon_hr_manager.py` for entity
//! shapes, the active-contract tie-break rule, and the pool sizing; on
//! `r2e-data-sqlx::repository::SqlxRepository`/`r2e-data::DataError` for the
//! repository-per-entity shape and the error type.

pub mod clusters;
pub mod companies;
pub mod contracts;
pub mod employees;
pub mod entities;
pub mod error;
pub mod payroll;
pub mod pool;

pub use clusters::ClusterRepository;
pub use companies::CompanyRepository;
pub use contracts::ContractRepository;
pub use employees::EmployeeRepository;
pub use error::{DataError, DataResult, SqlxErrorExt};
pub use payroll::PayrollRepository;
pub use pool::{check_connection, connect_pool, ConnectionStatus};

use sqlx::PgPool;
use std::sync::Arc;

/// Bundles one pool-backed repository per HR entity, handed to `hr-rpc`
/// handlers as a single dependency.
#[derive(Clone)]
pub struct HrData {
    pub companies: Arc<CompanyRepository>,
    pub employees: Arc<EmployeeRepository>,
    pub contracts: Arc<ContractRepository>,
    pub clusters: Arc<ClusterRepository>,
    pub payroll: Arc<PayrollRepository>,
}

impl HrData {
    pub fn new(pool: PgPool) -> Self {
        Self {
            companies: Arc::new(CompanyRepository::new(pool.clone())),
            employees: Arc::new(EmployeeRepository::new(pool.clone())),
            contracts: Arc::new(ContractRepository::new(pool.clone())),
            clusters: Arc::new(ClusterRepository::new(pool.clone())),
            payroll: Arc::new(PayrollRepository::new(pool)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::entities::EmployeePatch;

    #[test]
    fn empty_patch_has_no_fields_set() {
        let patch = EmployeePatch::default();
        assert!(patch.identifier.is_none());
        assert!(patch.is_active.is_none());
    }
}
