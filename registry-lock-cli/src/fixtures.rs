//! JSON fixture loading for registrars and domains
//!
//! ```json
//! {
//!   "registrars": [{
//!     "registrarId": "TheRegistrar",
//!     "name": "The Registrar",
//!     "registryLockAllowed": true,
//!     "contacts": [{
//!       "emailAddress": "marla.singer@example.com",
//!       "registryLockEmailAddress": "lock@example.com",
//!       "registryLockPassword": "hunter2"
//!     }]
//!   }],
//!   "domains": [{
//!     "domainName": "example.tld",
//!     "registrarId": "TheRegistrar",
//!     "statuses": ["clientHold"]
//!   }]
//! }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use registry_lock_core::traits::{DomainRepository, RegistrarRepository};
use registry_lock_core::types::{tld_of, Domain, Registrar, RegistrarContact, StatusValue};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixtures {
    #[serde(default)]
    pub registrars: Vec<RegistrarFixture>,
    #[serde(default)]
    pub domains: Vec<DomainFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarFixture {
    pub registrar_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub registry_lock_allowed: bool,
    #[serde(default)]
    pub contacts: Vec<ContactFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFixture {
    pub email_address: String,
    #[serde(default)]
    pub registry_lock_email_address: Option<String>,
    /// Plain text; hashed before it is stored
    #[serde(default)]
    pub registry_lock_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainFixture {
    /// Derived from the position and TLD when absent
    #[serde(default)]
    pub repo_id: Option<String>,
    pub domain_name: String,
    pub registrar_id: String,
    #[serde(default)]
    pub statuses: BTreeSet<StatusValue>,
    #[serde(default)]
    pub deletion_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub registrars: usize,
    pub domains: usize,
}

impl RegistrarFixture {
    fn into_registrar(self) -> Registrar {
        let contacts = self
            .contacts
            .into_iter()
            .map(|fixture| {
                let mut contact = RegistrarContact::new(fixture.email_address);
                match (fixture.registry_lock_email_address, fixture.registry_lock_password) {
                    (Some(lock_email), Some(password)) => {
                        contact.enable_registry_lock(lock_email, &password);
                    }
                    (lock_email, _) => contact.registry_lock_email_address = lock_email,
                }
                contact
            })
            .collect();

        Registrar {
            name: self.name.unwrap_or_else(|| self.registrar_id.clone()),
            registrar_id: self.registrar_id,
            registry_lock_allowed: self.registry_lock_allowed,
            contacts,
        }
    }
}

impl DomainFixture {
    fn into_domain(self, position: usize) -> Domain {
        let domain_name = self.domain_name.to_ascii_lowercase();
        let repo_id = self.repo_id.unwrap_or_else(|| {
            format!("{:X}-{}", position + 1, tld_of(&domain_name).to_ascii_uppercase())
        });

        let mut domain = Domain::new(repo_id, domain_name, self.registrar_id);
        domain.statuses = self.statuses;
        domain.deletion_time = self.deletion_time;
        domain
    }
}

pub fn parse(contents: &str) -> Result<Fixtures> {
    serde_json::from_str(contents).context("Invalid fixture JSON")
}

/// Read a fixture file and upsert everything in it.
pub async fn load_file(
    path: &Path,
    registrars: &dyn RegistrarRepository,
    domains: &dyn DomainRepository,
) -> Result<LoadSummary> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixtures {}", path.display()))?;
    let fixtures = parse(&contents)?;

    let mut summary = LoadSummary::default();
    for fixture in fixtures.registrars {
        let registrar = fixture.into_registrar();
        registrars.save(&registrar).await?;
        tracing::debug!("Loaded registrar {}", registrar.registrar_id);
        summary.registrars += 1;
    }
    for (position, fixture) in fixtures.domains.into_iter().enumerate() {
        let domain = fixture.into_domain(position);
        domains.save(&domain).await?;
        tracing::debug!("Loaded domain {} ({})", domain.domain_name, domain.repo_id);
        summary.domains += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use registry_lock_app::adapters::SqliteStore;

    use super::*;

    const SAMPLE: &str = r#"{
        "registrars": [{
            "registrarId": "TheRegistrar",
            "registryLockAllowed": true,
            "contacts": [
                {
                    "emailAddress": "marla.singer@example.com",
                    "registryLockEmailAddress": "lock@example.com",
                    "registryLockPassword": "hunter2"
                },
                { "emailAddress": "viewer@example.com" }
            ]
        }],
        "domains": [
            { "domainName": "Example.TLD", "registrarId": "TheRegistrar", "statuses": ["clientHold"] },
            { "repoId": "ROID-1", "domainName": "other.app", "registrarId": "TheRegistrar" }
        ]
    }"#;

    #[test]
    fn contacts_with_password_get_registry_lock() {
        let fixtures = parse(SAMPLE).unwrap();
        let registrar = fixtures.registrars.into_iter().next().unwrap().into_registrar();

        assert_eq!(registrar.name, "TheRegistrar");
        let lock_contact = registrar.find_contact("marla.singer@example.com").unwrap();
        assert!(lock_contact.registry_lock_allowed);
        assert!(lock_contact.verify_registry_lock_password("hunter2"));
        let viewer = registrar.find_contact("viewer@example.com").unwrap();
        assert!(!viewer.registry_lock_allowed);
    }

    #[test]
    fn domains_are_normalized() {
        let fixtures = parse(SAMPLE).unwrap();
        let domains: Vec<_> = fixtures
            .domains
            .into_iter()
            .enumerate()
            .map(|(i, d)| d.into_domain(i))
            .collect();

        assert_eq!(domains[0].domain_name, "example.tld");
        assert_eq!(domains[0].repo_id, "1-TLD");
        assert!(domains[0].has_status(StatusValue::ClientHold));
        assert_eq!(domains[1].repo_id, "ROID-1");
        assert_eq!(domains[1].tld, "app");
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = parse(r#"{"domains":[{"domainName":"a.tld","registrarId":"R","statuses":["locked"]}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid fixture JSON"));
    }

    #[tokio::test]
    async fn load_file_upserts_into_sqlite_store() {

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let store = SqliteStore::new(&dir.path().join("registry.db")).await.unwrap();

        let summary = load_file(&path, &store, &store).await.unwrap();
        assert_eq!(
            summary,
            LoadSummary {
                registrars: 1,
                domains: 2
            }
        );

        let registrar = RegistrarRepository::find_by_id(&store, "TheRegistrar")
            .await
            .unwrap()
            .unwrap();
        assert!(registrar.registry_lock_allowed);
        let domain = DomainRepository::find_by_name(&store, "example.tld")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(domain.repo_id, "1-TLD");

        // Loading again overwrites instead of duplicating
        let again = load_file(&path, &store, &store).await.unwrap();
        assert_eq!(again, summary);
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(&dir.path().join("registry.db")).await.unwrap();
        let err = load_file(&dir.path().join("absent.json"), &store, &store)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
