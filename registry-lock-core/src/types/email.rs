use serde::{Deserialize, Serialize};

/// Outgoing email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub from: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}
