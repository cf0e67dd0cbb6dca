//! Request and response types of the strategy backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use arcvault_core::dashboard::ActionBody;

// ── Strategies ──────────────────────────────────────────────────

// `GET /api/strategies` returns Vec<arcvault_core::descriptor::StrategyDescriptor>

// ── Run ─────────────────────────────────────────────────────────

/// Body of `POST /api/run/:id`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RunRequest {
    pub data: Value,
}

impl From<&ActionBody> for RunRequest {
    fn from(body: &ActionBody) -> Self {
        Self {
            data: body.to_data(),
        }
    }
}

// Response is arcvault_core::result::ActionResult
