//! A scripted origin for router and lifecycle tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::error::NetworkError;
use crate::exchange::{EdgeRequest, EdgeResponse};
use crate::network::Network;

/// Answers from a fixed table; unknown paths get a `404`.
#[derive(Default)]
pub struct ScriptedNetwork {
    responses: Mutex<HashMap<String, EdgeResponse>>,
    failing: Mutex<Vec<String>>,
    calls: Mutex<HashMap<String, usize>>,
    offline: AtomicBool,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path_and_query: &str, response: EdgeResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(path_and_query.to_string(), response);
    }

    /// Make one path fail at the transport level.
    pub fn fail(&self, path_and_query: &str) {
        self.failing.lock().unwrap().push(path_and_query.to_string());
    }

    /// Make every request fail at the transport level.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self, path_and_query: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(path_and_query)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &EdgeRequest) -> Result<EdgeResponse, NetworkError> {
        let key = request.path_and_query.clone();
        *self.calls.lock().unwrap().entry(key.clone()).or_insert(0) += 1;

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&key) {
            return Err(NetworkError::Unreachable(key));
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| EdgeResponse::new(StatusCode::NOT_FOUND, "text/plain", "not found")))
    }
}
