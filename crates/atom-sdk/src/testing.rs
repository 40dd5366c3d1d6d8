//! In-memory transport and fixtures shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{
    Arc,
    Mutex,
};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::client::GatewayClient;
use crate::config::SdkConfig;
use crate::transport::{
    ByteStream,
    GatewayRequest,
    Transport,
    TransportError,
    TransportResponse,
};

pub(crate) const SDK_JSON: &str = r#"{
    "gateway": "devops.example.com",
    "buildType": "WORKER",
    "projectId": "demo",
    "agentId": "agent-1",
    "secretKey": "s3cret",
    "buildId": "b-42",
    "vmSeqId": "1"
}"#;

pub(crate) fn sdk_config() -> SdkConfig {
    SdkConfig::parse(SDK_JSON).unwrap()
}

pub(crate) fn client(transport: MockTransport) -> GatewayClient {
    GatewayClient::with_transport(sdk_config(), Arc::new(transport)).unwrap()
}

#[derive(Default)]
struct MockState {
    responses: VecDeque<Result<TransportResponse, TransportError>>,
    downloads: VecDeque<MockStream>,
    requests: Vec<GatewayRequest>,
}

/// Replays queued responses in order and records every request it sees.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Ok(TransportResponse {
                status,
                body: Bytes::from(body.into()),
            }));
    }

    pub fn push_envelope(&self, status: i64, data: Value) {
        let message = if status == 0 {
            Value::Null
        } else {
            Value::from("failed")
        };
        let body = serde_json::json!({
            "status": status,
            "message": message,
            "data": data,
        });
        self.push_response(200, body.to_string());
    }

    pub fn push_error(&self, err: TransportError) {
        self.state.lock().unwrap().responses.push_back(Err(err));
    }

    pub fn push_download(&self, status: u16, chunks: Vec<Vec<u8>>) {
        self.state.lock().unwrap().downloads.push_back(MockStream {
            status,
            chunks: chunks.into_iter().map(Bytes::from).collect(),
            error: None,
        });
    }

    /// A 200 stream that yields `chunks` and then fails with `err`.
    pub fn push_failing_download(&self, chunks: Vec<Vec<u8>>, err: TransportError) {
        self.state.lock().unwrap().downloads.push_back(MockStream {
            status: 200,
            chunks: chunks.into_iter().map(Bytes::from).collect(),
            error: Some(err),
        });
    }

    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: GatewayRequest) -> Result<TransportResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request);
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("no response queued".to_string())))
    }

    async fn open(&self, request: GatewayRequest) -> Result<Box<dyn ByteStream>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request);
        match state.downloads.pop_front() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(TransportError::Request("no download queued".to_string())),
        }
    }
}

struct MockStream {
    status: u16,
    chunks: VecDeque<Bytes>,
    error: Option<TransportError>,
}

#[async_trait]
impl ByteStream for MockStream {
    fn status(&self) -> u16 {
        self.status
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        match self.chunks.pop_front() {
            Some(chunk) => Ok(Some(chunk)),
            None => match self.error.take() {
                Some(err) => Err(err),
                None => Ok(None),
            },
        }
    }
}
