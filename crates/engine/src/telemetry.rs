//! Usage notifications for data-source operations.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::json;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// The operation a telemetry notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryOperation {
    Read,
    Create,
    Update,
    Delete,
}

impl TelemetryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for TelemetryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fire-and-forget receiver of operation notifications.
pub trait TelemetryHandler: Send + Sync {
    fn submit(&self, resource_name: &str, operation: TelemetryOperation);
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetryHandler for NoopTelemetry {
    fn submit(&self, _resource_name: &str, _operation: TelemetryOperation) {}
}

/// Records notifications as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetryHandler for TracingTelemetry {
    fn submit(&self, resource_name: &str, operation: TelemetryOperation) {
        info!(resource = %resource_name, operation = %operation, "data source operation completed");
    }
}

/// Posts an `IncCounter` metric named `<resource>.<operation>` to an HTTP
/// endpoint on a background task. Delivery failures are only logged.
///
/// Submissions are tracked until [`HttpTelemetry::flush`] awaits them; callers
/// that shut their runtime down should flush first.
#[derive(Debug, Clone)]
pub struct HttpTelemetry {
    http: reqwest::Client,
    endpoint: String,
    pending: Arc<Mutex<JoinSet<()>>>,
}

impl HttpTelemetry {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            pending: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    fn metric_body(resource_name: &str, operation: TelemetryOperation) -> serde_json::Value {
        json!({
            "metric_type": "IncCounter",
            "metric_name": format!("{}.{}", resource_name, operation),
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    /// Waits for every submitted metric to be delivered or to fail.
    pub async fn flush(&self) {
        let mut tasks = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        let count = tasks.len();
        while let Some(result) = tasks.join_next().await {
            if let Err(error) = result {
                warn!(endpoint = %self.endpoint, error = %error, "telemetry task did not complete");
            }
        }
        debug!(endpoint = %self.endpoint, count, "telemetry flushed");
    }
}

impl TelemetryHandler for HttpTelemetry {
    fn submit(&self, resource_name: &str, operation: TelemetryOperation) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(resource = %resource_name, "no async runtime available; telemetry dropped");
            return;
        };

        let body = Self::metric_body(resource_name, operation);
        let request = self.http.post(&self.endpoint).json(&body);
        let endpoint = self.endpoint.clone();
        let delivery = async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(endpoint = %endpoint, status = %response.status(), "telemetry submitted");
                }
                Ok(response) => {
                    warn!(endpoint = %endpoint, status = %response.status(), "telemetry endpoint rejected metric");
                }
                Err(error) => {
                    warn!(endpoint = %endpoint, error = %error, "telemetry submission failed");
                }
            }
        };

        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        while pending.try_join_next().is_some() {}
        pending.spawn_on(delivery, &runtime);
    }
}
