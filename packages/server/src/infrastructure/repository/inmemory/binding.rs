//! InMemory Binding Repository 実装
//!
//! コネクション → (room, user) の紐付けを保持します。
//! 切断時のクリーンアップを O(1) で行うため、join の時点から記録します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Binding, BindingRepository, ConnectionId};

/// インメモリ Binding Repository 実装
#[derive(Default)]
pub struct InMemoryBindingRepository {
    bindings: Mutex<HashMap<ConnectionId, Binding>>,
}

impl InMemoryBindingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BindingRepository for InMemoryBindingRepository {
    async fn bind(&self, connection_id: ConnectionId, binding: Binding) -> Option<Binding> {
        let mut bindings = self.bindings.lock().await;
        bindings.insert(connection_id, binding)
    }

    async fn get(&self, connection_id: &ConnectionId) -> Option<Binding> {
        let bindings = self.bindings.lock().await;
        bindings.get(connection_id).cloned()
    }

    async fn unbind_if(&self, connection_id: &ConnectionId, binding: &Binding) -> bool {
        let mut bindings = self.bindings.lock().await;
        if bindings.get(connection_id) == Some(binding) {
            bindings.remove(connection_id);
            true
        } else {
            false
        }
    }
}
