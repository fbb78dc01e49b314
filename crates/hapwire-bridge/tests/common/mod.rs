//! Shared test helpers: a recording mock HTTP transport.

#![allow(dead_code)]

use async_trait::async_trait;
use hapwire_bridge::{AuthConfig, HttpResponse, HttpTransport};
use hapwire_core::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One request seen by the mock transport.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
    pub auth: Option<String>,
}

/// Canned behavior for one URL.
#[derive(Debug, Clone)]
enum Route {
    Respond { status: u16, body: String },
    Fail,
    /// 401 without credentials, 200 with them.
    Challenge { body: String },
}

/// Recording mock transport with canned per-URL responses.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Respond with 200 and the given body.
    pub fn respond(&self, url: &str, body: &str) {
        self.respond_with_status(url, 200, body);
    }

    pub fn respond_with_status(&self, url: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route::Respond {
                status,
                body: body.to_string(),
            },
        );
    }

    /// Fail requests to this URL at the transport level.
    pub fn fail(&self, url: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Fail);
    }

    /// Demand basic-auth via a 401 challenge for this URL.
    pub fn challenge(&self, url: &str, body: &str) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route::Challenge {
                body: body.to_string(),
            },
        );
    }

    /// Delay every request by this long (tokio time, works when paused).
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn request(
        &self,
        method: &str,
        url: &str,
        body: &str,
        auth: Option<&AuthConfig>,
    ) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            body: body.to_string(),
            auth: auth.map(|a| a.username.clone()),
        });

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let route = self.routes.lock().unwrap().get(url).cloned();
        match route {
            Some(Route::Respond { status, body }) => Ok(HttpResponse { status, body }),
            Some(Route::Fail) | None => {
                Err(Error::network(format!("connection refused: {}", url)))
            }
            Some(Route::Challenge { body }) => match auth {
                Some(_) => Ok(HttpResponse { status: 200, body }),
                None => Ok(HttpResponse {
                    status: 401,
                    body: String::new(),
                }),
            },
        }
    }
}
