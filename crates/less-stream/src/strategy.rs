//! Live strategies and options for the multicast adapters.

use serde::{Deserialize, Serialize};

use crate::error::soft_assert;

/// When a multicast adapter opens and closes its upstream connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveStrategy {
    /// Open on first use; stay open until the owner lets go, whatever the
    /// number of downstream listeners.
    #[default]
    Continuous,
    /// Open when the listener count goes 0→1, close when it goes 1→0.
    Repeatable,
}

/// Snapshot of an adapter's connection state, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveState {
    pub strategy: LiveStrategy,
    /// Downstream listeners currently attached through the adapter.
    pub listeners: usize,
    /// Whether the upstream connection is open.
    pub connected: bool,
}

/// Construction options for `shared` / `share` adapters.
///
/// Deserializable so hosts can keep adapter settings in their own config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareOptions {
    pub strategy: LiveStrategy,
    /// Name attached to this adapter's log events.
    pub label: Option<String>,
}

impl ShareOptions {
    pub fn new(strategy: LiveStrategy) -> Self {
        Self {
            strategy,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn label(&self) -> &str {
        soft_assert!(
            self.label.as_deref() != Some(""),
            "adapter label must not be empty"
        );
        self.label.as_deref().unwrap_or("unlabeled")
    }
}

impl From<LiveStrategy> for ShareOptions {
    fn from(strategy: LiveStrategy) -> Self {
        Self::new(strategy)
    }
}
