use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::VenueKbError;
use crate::models::{OnboardingAnswer, ReviewDecision, Section, SectionState};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum KbRequest {
    Ping,
    Health,
    /// One pass over one transcript
    Extract {
        venue_id: Uuid,
        transcript: String,
        pass: String,
    },
    /// All six passes over one transcript, sequentially
    ExtractAll {
        venue_id: Uuid,
        transcript: String,
    },
    Onboarding {
        venue_id: Uuid,
        answers: Vec<OnboardingAnswer>,
        #[serde(default)]
        replace_existing: bool,
    },
    Pending {
        venue_id: Uuid,
    },
    Review {
        id: Uuid,
        decision: ReviewDecision,
    },
    Progress {
        venue_id: Uuid,
        #[serde(default)]
        sections: HashMap<Section, SectionState>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KbResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub version: String,
}

impl KbResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(serde_json::json!({"pong": true}))
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Decode one MessagePack frame payload into a request.
pub fn decode_request(payload: &[u8]) -> Result<KbRequest, VenueKbError> {
    rmp_serde::from_slice(payload).map_err(|e| VenueKbError::Ipc(format!("Deserialization error: {}", e)))
}

/// Encode a response as a MessagePack map (field names kept).
pub fn encode_response(response: &KbResponse) -> Result<Vec<u8>, VenueKbError> {
    rmp_serde::to_vec_named(response).map_err(|e| VenueKbError::Ipc(format!("Serialization error: {}", e)))
}
