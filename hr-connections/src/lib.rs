//! Connection cache for outbound ERP (Odoo) and Drive clients, grounded on
//! `original_source/app/erp_service.py`'s `ODOO_CONNECTION_MANAGER` (the
//! cache-by-credentials, probe-before-trust, invalidate-on-failure shape)
//! generalized to a single reusable `ConnectionCache<C>`.

pub mod cache;
pub mod connectable;
pub mod drive;
pub mod odoo;
pub mod xmlrpc;

pub use cache::{ConnectionCache, ConnectionError, ConnectionFactory, DEFAULT_TTL};
pub use connectable::{Connectable, ProbeFailure};
pub use drive::{DriveClient, DriveClientFactory, DriveError};
pub use odoo::{OdooClient, OdooClientFactory, OdooError};
