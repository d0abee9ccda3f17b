//! Domain entity as seen by the lock workflow

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{StatusValue, REGISTRY_LOCK_STATUSES};

/// Registered domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Repository id, stable across renames and transfers
    pub repo_id: String,
    /// Fully qualified domain name
    pub domain_name: String,
    /// Top level domain
    pub tld: String,
    /// Registrar currently sponsoring the domain
    pub current_sponsor_registrar_id: String,
    /// EPP statuses
    #[serde(default)]
    pub statuses: BTreeSet<StatusValue>,
    /// Set once the domain is deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_time: Option<DateTime<Utc>>,
    /// Optimistic concurrency counter, bumped by every write
    #[serde(default)]
    pub revision: i64,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    /// Create a live domain with no statuses
    #[must_use]
    pub fn new(repo_id: String, domain_name: String, current_sponsor_registrar_id: String) -> Self {
        let tld = tld_of(&domain_name);
        Self {
            repo_id,
            domain_name,
            tld,
            current_sponsor_registrar_id,
            statuses: BTreeSet::new(),
            deletion_time: None,
            revision: 0,
            updated_at: Utc::now(),
        }
    }

    /// Carries every registry lock status
    #[must_use]
    pub fn is_registry_locked(&self) -> bool {
        REGISTRY_LOCK_STATUSES
            .iter()
            .all(|s| self.statuses.contains(s))
    }

    /// Carries at least one registry lock status
    #[must_use]
    pub fn has_any_lock_status(&self) -> bool {
        REGISTRY_LOCK_STATUSES
            .iter()
            .any(|s| self.statuses.contains(s))
    }

    /// Deleted at or before `now`
    #[must_use]
    pub fn is_deleted_at(&self, now: DateTime<Utc>) -> bool {
        self.deletion_time.is_some_and(|t| t <= now)
    }

    #[must_use]
    pub fn has_status(&self, status: StatusValue) -> bool {
        self.statuses.contains(&status)
    }
}

/// Last label of a domain name, lowercased.
#[must_use]
pub fn tld_of(domain_name: &str) -> String {
    domain_name
        .trim_end_matches('.')
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn domain() -> Domain {
        Domain::new(
            "1-TLD".to_string(),
            "example.tld".to_string(),
            "TheRegistrar".to_string(),
        )
    }

    #[test]
    fn new_domain_derives_tld() {
        assert_eq!(domain().tld, "tld");
        assert_eq!(tld_of("foo.co.UK."), "uk");
    }

    #[test]
    fn partially_locked_domain_is_not_locked() {
        let mut d = domain();
        d.statuses.insert(StatusValue::ServerDeleteProhibited);
        assert!(!d.is_registry_locked());
        assert!(d.has_any_lock_status());

        d.statuses.extend(REGISTRY_LOCK_STATUSES);
        assert!(d.is_registry_locked());
    }

    #[test]
    fn deletion_is_inclusive() {
        let now = Utc::now();
        let mut d = domain();
        assert!(!d.is_deleted_at(now));
        d.deletion_time = Some(now);
        assert!(d.is_deleted_at(now));
        assert!(!d.is_deleted_at(now - Duration::seconds(1)));
    }
}
