//! Registrar and registrar contact types

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Loose RFC 5322 shape check used before handing addresses to the mailer
#[must_use]
pub fn is_valid_email(address: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(address))
}

/// Registrar account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registrar {
    pub registrar_id: String,
    pub name: String,
    /// Whether the registrar may use registry lock at all
    #[serde(default)]
    pub registry_lock_allowed: bool,
    #[serde(default)]
    pub contacts: Vec<RegistrarContact>,
}

impl Registrar {
    /// Contact whose login email matches `email`
    #[must_use]
    pub fn find_contact(&self, email: &str) -> Option<&RegistrarContact> {
        self.contacts
            .iter()
            .find(|c| c.email_address.eq_ignore_ascii_case(email))
    }

    pub fn find_contact_mut(&mut self, email: &str) -> Option<&mut RegistrarContact> {
        self.contacts
            .iter_mut()
            .find(|c| c.email_address.eq_ignore_ascii_case(email))
    }

    /// Lock notification addresses of every lock-enabled contact.
    ///
    /// Malformed addresses are skipped so one bad contact never blocks the rest.
    #[must_use]
    pub fn registry_lock_recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = Vec::new();
        for contact in self.contacts.iter().filter(|c| c.registry_lock_allowed) {
            let Some(address) = contact.registry_lock_email_address.as_deref() else {
                continue;
            };
            if !is_valid_email(address) {
                log::warn!("Invalid email address {address}");
                continue;
            }
            if !recipients.iter().any(|r| r == address) {
                recipients.push(address.to_string());
            }
        }
        recipients
    }
}

/// Registrar point of contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarContact {
    /// Login email
    pub email_address: String,
    #[serde(default)]
    pub registry_lock_allowed: bool,
    /// Where lock related notifications go
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_lock_email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_lock_password_salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_lock_password_hash: Option<String>,
}

impl RegistrarContact {
    #[must_use]
    pub fn new(email_address: String) -> Self {
        Self {
            email_address,
            registry_lock_allowed: false,
            registry_lock_email_address: None,
            registry_lock_password_salt: None,
            registry_lock_password_hash: None,
        }
    }

    /// Enable registry lock for this contact with the given password
    pub fn enable_registry_lock(&mut self, lock_email: String, password: &str) {
        let (salt, hash) = crate::crypto::hash_password(password);
        self.registry_lock_allowed = true;
        self.registry_lock_email_address = Some(lock_email);
        self.registry_lock_password_salt = Some(salt);
        self.registry_lock_password_hash = Some(hash);
    }

    /// Check a registry lock password. Contacts without a stored password never match.
    #[must_use]
    pub fn verify_registry_lock_password(&self, password: &str) -> bool {
        match (
            &self.registry_lock_password_salt,
            &self.registry_lock_password_hash,
        ) {
            (Some(salt), Some(hash)) => crate::crypto::verify_password(password, salt, hash),
            _ => false,
        }
    }
}
