//! Client model for quoting-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Client a quote or invoice is addressed to. Resolved (or created) by name
/// during quote creation and copying.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub client_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub created_utc: DateTime<Utc>,
}
