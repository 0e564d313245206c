use serde::{Deserialize, Serialize};

/// Predicate for cached reads and remote snapshots. Every field narrows the
/// result; the default matches the whole family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityQuery {
    pub scope_id: Option<String>,
    #[serde(default)]
    pub unsynced_only: bool,
    #[serde(default)]
    pub include_expired: bool,
    pub limit: Option<u32>,
}

impl EntityQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn scoped(scope_id: impl Into<String>) -> Self {
        Self {
            scope_id: Some(scope_id.into()),
            ..Self::default()
        }
    }

    pub fn unsynced() -> Self {
        Self {
            unsynced_only: true,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Key used to sequence concurrent fetches of the same view.
    ///
    /// `unsynced_only` and `include_expired` only filter the cached view and
    /// never change what is fetched, so they are left out of the key.
    pub fn sequence_key(&self) -> String {
        format!(
            "{}|{}",
            self.scope_id.as_deref().unwrap_or("*"),
            self.limit.map(|l| l.to_string()).unwrap_or_default()
        )
    }
}
