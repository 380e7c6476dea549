//! Single source of truth for cache TTLs — keep the table in one place
//! instead of scattering magic numbers through the handler modules.

use std::time::Duration;

use crate::key::Family;

/// Looks up the TTL for a given family and subkey. `subkey` is matched by
/// prefix where the table names a prefix (e.g. `contracts:`), and exactly
/// where it names a literal subkey (e.g. `employees`).
pub fn family_ttl(family: Family, subkey: &str) -> Duration {
    let secs = match family {
        Family::Hr => hr_ttl_secs(subkey),
        Family::Drive => 1800,
        Family::Erp => 1800,
        Family::LlmRef => 86_400,
    };
    Duration::from_secs(secs)
}

fn hr_ttl_secs(subkey: &str) -> u64 {
    if subkey == "employees"
        || subkey.starts_with("employee:")
        || subkey.starts_with("contracts:")
        || subkey.starts_with("active_contract:")
    {
        3600
    } else if subkey == "clusters" || subkey.starts_with("clusters:") || subkey.starts_with("references:") {
        86_400
    } else {
        3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employees_is_one_hour() {
        assert_eq!(family_ttl(Family::Hr, "employees"), Duration::from_secs(3600));
    }

    #[test]
    fn employee_by_id_is_one_hour() {
        assert_eq!(family_ttl(Family::Hr, "employee:abc-123"), Duration::from_secs(3600));
    }

    #[test]
    fn clusters_is_one_day() {
        assert_eq!(family_ttl(Family::Hr, "clusters"), Duration::from_secs(86_400));
        assert_eq!(family_ttl(Family::Hr, "clusters:fr"), Duration::from_secs(86_400));
    }

    #[test]
    fn references_is_one_day() {
        assert_eq!(family_ttl(Family::Hr, "references:fr:fr"), Duration::from_secs(86_400));
    }

    #[test]
    fn drive_documents_is_thirty_minutes() {
        assert_eq!(family_ttl(Family::Drive, "documents"), Duration::from_secs(1800));
    }
}
