//! Audit trail of admin actions
//!
//! Appends one JSON object per line. Nothing is written until a file is
//! configured with `init_file`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::store::Collection;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    LoginAttempt,
    InsightsSaved,
    PhasesSaved,
    ClosingsSaved,
    VignettesSaved,
    BudgetUsage,
    BudgetReset,
}

impl EventType {
    fn saved(collection: Collection) -> Self {
        match collection {
            Collection::Insights => Self::InsightsSaved,
            Collection::Phases => Self::PhasesSaved,
            Collection::Closings => Self::ClosingsSaved,
            Collection::Vignettes => Self::VignettesSaved,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    /// Instance that handled the request
    pub node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(event_type: EventType, node_id: String) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            node_id,
            username: None,
            success: None,
            detail: None,
        }
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// JSONL audit writer, cheap to clone
#[derive(Clone)]
pub struct AuditLogger {
    inner: Arc<Mutex<Option<BufWriter<File>>>>,
    node_id: String,
}

impl AuditLogger {
    pub fn new(node_id: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
            node_id,
        }
    }

    /// Start appending to `path`
    pub async fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        *self.inner.lock().await = Some(BufWriter::new(file));

        info!(path = %path.display(), "Audit logging enabled");
        Ok(())
    }

    pub async fn log(&self, event: AuditEvent) {
        let line = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize audit event: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;
        if let Some(writer) = inner.as_mut() {
            if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                error!("Failed to write audit event: {}", e);
            }
        }
    }

    pub async fn log_login(&self, username: &str, success: bool) {
        let event = AuditEvent::new(EventType::LoginAttempt, self.node_id.clone())
            .with_username(username)
            .with_success(success);
        self.log(event).await;
    }

    pub async fn log_saved(&self, collection: Collection, username: &str, detail: serde_json::Value) {
        let event = AuditEvent::new(EventType::saved(collection), self.node_id.clone())
            .with_username(username)
            .with_success(true)
            .with_detail(detail);
        self.log(event).await;
    }

    pub async fn log_budget_usage(&self, masked_device_id: &str, dollar_cost: f64, alerts: usize) {
        let event = AuditEvent::new(EventType::BudgetUsage, self.node_id.clone()).with_detail(
            serde_json::json!({
                "deviceId": masked_device_id,
                "cost": dollar_cost,
                "alerts": alerts,
            }),
        );
        self.log(event).await;
    }

    pub async fn log_budget_reset(&self, username: &str) {
        let event = AuditEvent::new(EventType::BudgetReset, self.node_id.clone())
            .with_username(username)
            .with_success(true);
        self.log(event).await;
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}
