//! The one place a cache key string is ever constructed.
//!
//! Grounded on `original_source/app/tools/hr_cache_manager.py`'s
//! `_build_cache_key` — `cache:{user_id}:{company_id}:{data_type}[:sub_type]` —
//! generalized from the HR-only `data_type` to the full `Family` taxonomy
//! (`hr`, `erp`, `drive`, `llm_ref`).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Hr,
    Erp,
    Drive,
    LlmRef,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Hr => "hr",
            Family::Erp => "erp",
            Family::Drive => "drive",
            Family::LlmRef => "llm_ref",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hr" => Some(Family::Hr),
            "erp" => Some(Family::Erp),
            "drive" => Some(Family::Drive),
            "llm_ref" => Some(Family::LlmRef),
            _ => None,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `cache:{user}:{tenant}:{family}:{subkey}` — the only allowed key shape.
/// The subkey may itself embed colons for entity ids.
pub fn build_key(user: &str, tenant: &str, family: Family, subkey: &str) -> String {
    format!("cache:{user}:{tenant}:{family}:{subkey}")
}

/// `cache:{user}:{tenant}:{family}:*` — the pattern used for bulk
/// invalidation cursor scans.
pub fn family_pattern(user: &str, tenant: &str, family: Family) -> String {
    format!("cache:{user}:{tenant}:{family}:*")
}

/// `cache:{user}:{tenant}:*` — the pattern used for whole-tenant stats.
pub fn tenant_pattern(user: &str, tenant: &str) -> String {
    format!("cache:{user}:{tenant}:*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_key_matches_discipline_regex() {
        let key = build_key("u1", "t1", Family::Hr, "employees");
        assert_eq!(key, "cache:u1:t1:hr:employees");
        let re = regex_lite_matches(&key);
        assert!(re);
    }

    #[test]
    fn subkey_may_embed_colons() {
        let key = build_key("u1", "t1", Family::Hr, "contracts:emp-42");
        assert_eq!(key, "cache:u1:t1:hr:contracts:emp-42");
    }

    /// Hand-rolled check of `^cache:[^:]+:[^:]+:(hr|erp|drive|llm_ref):.+$`
    /// without pulling in a regex crate for one test.
    fn regex_lite_matches(key: &str) -> bool {
        let Some(rest) = key.strip_prefix("cache:") else { return false };
        let mut parts = rest.splitn(4, ':');
        let (Some(user), Some(tenant), Some(family), Some(subkey)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        !user.is_empty()
            && !tenant.is_empty()
            && Family::parse(family).is_some()
            && !subkey.is_empty()
    }
}
