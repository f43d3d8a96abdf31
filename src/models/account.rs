//! Linked trading accounts.

use serde::{Deserialize, Serialize};

/// Opaque identifier for an account that mirrors confirmed trades.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountHandle {
    /// Broker login or account label
    pub id: String,

    /// Trade server the account lives on
    #[serde(default)]
    pub server: Option<String>,
}

impl AccountHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            server: None,
        }
    }
}

impl std::fmt::Display for AccountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.server {
            Some(server) => write!(f, "{}@{}", self.id, server),
            None => write!(f, "{}", self.id),
        }
    }
}
