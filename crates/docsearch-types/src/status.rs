//! Health reporting types.

use serde::{Deserialize, Serialize};

/// Whether an external document source (e.g. a wiki API) is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub available: bool,
    pub error_message: Option<String>,
    /// Configured endpoint, "Not set" when absent
    pub url: String,
    /// Configured account, "Not set" when absent
    pub username: String,
}

impl ConnectionStatus {
    pub fn available(url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            available: true,
            error_message: None,
            url: url.into(),
            username: username.into(),
        }
    }

    pub fn unavailable(
        error: impl Into<String>,
        url: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            available: false,
            error_message: Some(error.into()),
            url: url.into(),
            username: username.into(),
        }
    }
}

/// Summary of the shared index for health reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    /// An index has been created or loaded
    pub has_index: bool,
    /// Number of records currently held
    pub record_count: usize,
    /// Fixed dimensionality, if an index exists
    pub dimension: Option<usize>,
}
