//! `{status, message, data}` response envelope
//!
//! Every gateway endpoint wraps its payload in this envelope. `status == 0`
//! means success; `data` is only read in that case.

use serde::de::DeserializeOwned;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

use crate::error::{
    GatewayError,
    GatewayResult,
};
use crate::transport::TransportResponse;

pub const STATUS_OK: i64 = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ResponseEnvelope {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Deserializes `data` into the endpoint's payload type.
    pub fn into_data<T: DeserializeOwned>(self) -> GatewayResult<T> {
        if !self.is_success() {
            return Err(GatewayError::Envelope {
                status: self.status,
                message: self.message.unwrap_or_default(),
            });
        }
        Ok(serde_json::from_value(self.data)?)
    }
}

/// Interprets a raw gateway response, logging every failure it produces.
pub(crate) fn decode<T: DeserializeOwned>(response: &TransportResponse) -> GatewayResult<T> {
    if response.status != 200 {
        let message = error_message(&response.body);
        tracing::error!(
            "unexpected status_code: {}, message is {}",
            response.status,
            message
        );
        return Err(GatewayError::Http {
            status: response.status,
            message,
        });
    }

    let envelope: ResponseEnvelope = serde_json::from_slice(&response.body).map_err(|e| {
        tracing::error!(
            "failed to parse response: {e}, body is {:?}",
            String::from_utf8_lossy(&response.body)
        );
        GatewayError::from(e)
    })?;

    if !envelope.is_success() {
        tracing::error!(
            "unexpected status: {}, content is {}",
            envelope.status,
            serde_json::to_string(&envelope).unwrap_or_default()
        );
    }

    envelope.into_data().inspect_err(|e| {
        if matches!(e, GatewayError::Decode(_)) {
            tracing::error!("unexpected payload shape: {e}");
        }
    })
}

fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}
