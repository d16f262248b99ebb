//! QR check-in payload decoding.
//!
//! A scanned (or manually typed) code carries a small JSON object with a
//! `"type"` tag. Decoding is total over arbitrary input: malformed JSON,
//! unknown tags, and empty identifiers all come back as [`CheckinError`],
//! never a panic. Camera access itself is out of scope; this module only
//! sees the string a scanner hands over.

use serde::{Deserialize, Serialize};

/// A decoded QR payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QrPayload {
    /// A code posted at the venue: any attendee scanning it checks in.
    EventCheckin {
        /// The event being checked in to.
        event_id: String,
    },
    /// A personal ticket: checks a specific user in to a specific event.
    Ticket {
        /// The event being checked in to.
        event_id: String,
        /// The ticket holder.
        user_id: String,
    },
}

impl QrPayload {
    /// The event id this payload refers to.
    pub fn event_id(&self) -> &str {
        match self {
            QrPayload::EventCheckin { event_id } => event_id,
            QrPayload::Ticket { event_id, .. } => event_id,
        }
    }
}

/// Errors produced while decoding a scanned code.
#[derive(Debug, thiserror::Error)]
pub enum CheckinError {
    /// The scanned string was not valid JSON or had an unknown type tag.
    #[error("unrecognized QR payload: {0}")]
    Unrecognized(#[from] serde_json::Error),

    /// The payload parsed but carried an empty identifier.
    #[error("QR payload has an empty {0} field")]
    EmptyField(&'static str),
}

/// Decode a scanned QR string (or a manually typed code) into a payload.
///
/// # Errors
///
/// Returns [`CheckinError::Unrecognized`] for malformed JSON or an unknown
/// `"type"` tag, and [`CheckinError::EmptyField`] when a required id is
/// blank.
pub fn decode_payload(raw: &str) -> Result<QrPayload, CheckinError> {
    let payload: QrPayload = serde_json::from_str(raw)?;

    if payload.event_id().trim().is_empty() {
        return Err(CheckinError::EmptyField("event_id"));
    }
    if let QrPayload::Ticket { user_id, .. } = &payload {
        if user_id.trim().is_empty() {
            return Err(CheckinError::EmptyField("user_id"));
        }
    }

    Ok(payload)
}
