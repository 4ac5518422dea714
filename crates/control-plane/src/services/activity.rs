// Read side of the side-effect tables: notifications and audit logs

use std::sync::Arc;

use eventdesk_core::{Actor, AuditLogEntry, Result};

use crate::storage::{NotificationRow, StorageBackend};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;

pub struct ActivityService {
    storage: Arc<StorageBackend>,
}

impl ActivityService {
    pub fn new(storage: Arc<StorageBackend>) -> Self {
        Self { storage }
    }

    /// The caller's own in-app notifications, newest first
    pub async fn notifications(
        &self,
        actor: &Actor,
        limit: Option<i64>,
    ) -> Result<Vec<NotificationRow>> {
        self.storage
            .list_notifications(actor.id, page_size(limit))
            .await
    }

    pub async fn audit_logs(&self, actor: &Actor, limit: Option<i64>) -> Result<Vec<AuditLogEntry>> {
        actor.require_admin()?;
        self.storage.list_audit_logs(page_size(limit)).await
    }
}

fn page_size(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(page_size(Some(0)), 1);
        assert_eq!(page_size(Some(10_000)), MAX_PAGE_SIZE);
        assert_eq!(page_size(Some(20)), 20);
    }
}
