//! The liveness probe.

use axum::Json;
use serde::{Deserialize, Serialize};

/// The body returned by the health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always "ok".
    pub status: String,
    /// A short description of the service.
    pub message: String,
}

/// Report that the server is up.
pub async fn health_endpoint() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_owned(),
        message: "Expense Tracker API funcionando".to_owned(),
    })
}
