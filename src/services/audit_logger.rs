use std::sync::Arc;

use crate::{dal::JobStore, domain::AuditRecord};

/// Best-effort appender: a failed audit write is logged and swallowed so it
/// can never change a run's outcome.
pub struct AuditLogger {
    store: Arc<dyn JobStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        AuditLogger { store }
    }

    pub async fn log(&self, record: AuditRecord) {
        let action = record.action;
        if let Err(e) = self.store.append_audit(record).await {
            log::warn!("audit write for {:?} failed: {:?}", action, e);
        }
    }
}
