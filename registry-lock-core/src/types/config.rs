//! Lock workflow configuration

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::history::Money;

fn default_verification_window_secs() -> u64 {
    3600
}

fn default_base_url() -> String {
    "https://registry.example".to_string()
}

fn default_outgoing_email_address() -> String {
    "noreply@registry.example".to_string()
}

fn default_support_email() -> String {
    "support@registry.example".to_string()
}

fn default_alert_recipient_email_address() -> String {
    "alerts@registry.example".to_string()
}

fn default_registry_admin_registrar_id() -> String {
    "TheRegistrar".to_string()
}

fn default_max_transaction_attempts() -> u32 {
    3
}

fn default_server_status_change_cost() -> Money {
    Money::new("USD", 2000)
}

/// Registry lock settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LockConfig {
    /// How long a pending lock / unlock can be verified
    #[serde(default = "default_verification_window_secs")]
    pub verification_window_secs: u64,
    /// Console base URL used in verification links
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_outgoing_email_address")]
    pub outgoing_email_address: String,
    #[serde(default = "default_support_email")]
    pub support_email: String,
    /// Also receives relock failure alerts
    #[serde(default = "default_alert_recipient_email_address")]
    pub alert_recipient_email_address: String,
    /// Registrar used by admin tooling when none is given
    #[serde(default = "default_registry_admin_registrar_id")]
    pub registry_admin_registrar_id: String,
    /// Attempts per unit of work when a concurrent modification is detected
    #[serde(default = "default_max_transaction_attempts")]
    pub max_transaction_attempts: u32,
    #[serde(default = "default_server_status_change_cost")]
    pub default_server_status_change_cost: Money,
    /// Per-TLD overrides of the server status change cost
    #[serde(default)]
    pub server_status_change_costs: HashMap<String, Money>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            verification_window_secs: default_verification_window_secs(),
            base_url: default_base_url(),
            outgoing_email_address: default_outgoing_email_address(),
            support_email: default_support_email(),
            alert_recipient_email_address: default_alert_recipient_email_address(),
            registry_admin_registrar_id: default_registry_admin_registrar_id(),
            max_transaction_attempts: default_max_transaction_attempts(),
            default_server_status_change_cost: default_server_status_change_cost(),
            server_status_change_costs: HashMap::new(),
        }
    }
}

impl LockConfig {
    #[must_use]
    pub fn verification_window(&self) -> Duration {
        Duration::from_secs(self.verification_window_secs)
    }

    /// Cost of a registrar-requested server status change on `tld`
    #[must_use]
    pub fn server_status_change_cost(&self, tld: &str) -> Money {
        self.server_status_change_costs
            .get(tld)
            .cloned()
            .unwrap_or_else(|| self.default_server_status_change_cost.clone())
    }

    /// Verification link sent to the requesting contact
    #[must_use]
    pub fn verification_url(&self, verification_code: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        match url::Url::parse(&format!("{base}/registry-lock-verify")) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("lockVerificationCode", verification_code);
                url.to_string()
            }
            Err(e) => {
                log::warn!("Invalid base_url {base}: {e}");
                format!("{base}/registry-lock-verify?lockVerificationCode={verification_code}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hour_window() {
        let config = LockConfig::default();
        assert_eq!(config.verification_window(), Duration::from_secs(3600));
        assert_eq!(config.max_transaction_attempts, 3);
    }

    #[test]
    fn per_tld_cost_overrides_default() {
        let mut config = LockConfig::default();
        config
            .server_status_change_costs
            .insert("app".to_string(), Money::new("USD", 5000));
        assert_eq!(config.server_status_change_cost("app"), Money::new("USD", 5000));
        assert_eq!(config.server_status_change_cost("tld"), Money::new("USD", 2000));
    }

    #[test]
    fn verification_url_has_code_param() {
        let config = LockConfig {
            base_url: "https://console.example/".to_string(),
            ..LockConfig::default()
        };
        assert_eq!(
            config.verification_url("abc-123"),
            "https://console.example/registry-lock-verify?lockVerificationCode=abc-123"
        );
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: LockConfig =
            serde_json::from_str(r#"{"verification_window_secs": 60}"#).unwrap();
        assert_eq!(config.verification_window_secs, 60);
        assert_eq!(config.registry_admin_registrar_id, "TheRegistrar");
    }
}
