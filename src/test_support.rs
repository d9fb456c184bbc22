// src/test_support.rs
// Helpers for tests that need a fake GitHub on a local port.

use axum::Router;
use std::sync::{Arc, Mutex};

/// Serves `app` on an ephemeral localhost port and returns its base URL.
///
/// The listener is bound before this returns, so requests can be sent
/// immediately.
pub async fn spawn_fake(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake upstream");
    });
    format!("http://{}", addr)
}

/// Records the Authorization header (or its absence) of each request seen.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Option<String>>>>,
}

impl Recorder {
    pub fn record(&self, auth: Option<String>) {
        self.seen.lock().unwrap().push(auth);
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}
