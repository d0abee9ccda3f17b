//! EPP domain status values

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// EPP status value (RFC 5731 §2.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusValue {
    Ok,
    Inactive,
    ClientDeleteProhibited,
    ClientHold,
    ClientRenewProhibited,
    ClientTransferProhibited,
    ClientUpdateProhibited,
    PendingCreate,
    PendingDelete,
    PendingRenew,
    PendingTransfer,
    PendingUpdate,
    ServerDeleteProhibited,
    ServerHold,
    ServerRenewProhibited,
    ServerTransferProhibited,
    ServerUpdateProhibited,
}

/// Statuses applied by a registry lock and removed by an unlock.
pub const REGISTRY_LOCK_STATUSES: [StatusValue; 3] = [
    StatusValue::ServerDeleteProhibited,
    StatusValue::ServerTransferProhibited,
    StatusValue::ServerUpdateProhibited,
];

impl StatusValue {
    /// EPP wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Inactive => "inactive",
            Self::ClientDeleteProhibited => "clientDeleteProhibited",
            Self::ClientHold => "clientHold",
            Self::ClientRenewProhibited => "clientRenewProhibited",
            Self::ClientTransferProhibited => "clientTransferProhibited",
            Self::ClientUpdateProhibited => "clientUpdateProhibited",
            Self::PendingCreate => "pendingCreate",
            Self::PendingDelete => "pendingDelete",
            Self::PendingRenew => "pendingRenew",
            Self::PendingTransfer => "pendingTransfer",
            Self::PendingUpdate => "pendingUpdate",
            Self::ServerDeleteProhibited => "serverDeleteProhibited",
            Self::ServerHold => "serverHold",
            Self::ServerRenewProhibited => "serverRenewProhibited",
            Self::ServerTransferProhibited => "serverTransferProhibited",
            Self::ServerUpdateProhibited => "serverUpdateProhibited",
        }
    }

    /// Whether this status is one of [`REGISTRY_LOCK_STATUSES`]
    #[must_use]
    pub fn is_registry_lock_status(self) -> bool {
        REGISTRY_LOCK_STATUSES.contains(&self)
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusValue {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| CoreError::ValidationError(format!("Unknown status value: {s}")))
    }
}

/// Returns `statuses` with every registry lock status added.
#[must_use]
pub fn with_lock_statuses(statuses: &BTreeSet<StatusValue>) -> BTreeSet<StatusValue> {
    let mut result = statuses.clone();
    result.extend(REGISTRY_LOCK_STATUSES);
    result
}

/// Returns `statuses` with every registry lock status removed.
#[must_use]
pub fn without_lock_statuses(statuses: &BTreeSet<StatusValue>) -> BTreeSet<StatusValue> {
    statuses
        .iter()
        .copied()
        .filter(|s| !s.is_registry_lock_status())
        .collect()
}
