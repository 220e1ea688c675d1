//! Per-user value store
//!
//! Volatile, cleared on restart. One string value per user.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::metrics::USER_VALUES;

/// Process-wide user -> value table
///
/// Cloning shares the underlying table.
#[derive(Debug, Clone, Default)]
pub struct UserValues {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl UserValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored for `user`, if any
    pub async fn get(&self, user: &str) -> Option<String> {
        let values = self.values.read().await;
        values.get(user).cloned()
    }

    /// Store `value` for `user`, returning the value it replaced
    pub async fn set(&self, user: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let mut values = self.values.write().await;
        let previous = values.insert(user.into(), value.into());
        USER_VALUES.set(values.len() as i64);
        previous
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}
