//! Background client for the text store.
//!
//! Requests run on a worker thread with a blocking `reqwest` client so the
//! frame loop never waits on the network. Results come back through
//! [`RemoteClient::poll`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use crate::error::RemoteError;

/// Store address used when none is configured.
pub const DEFAULT_STORE_URL: &str = "http://127.0.0.1:8080";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Completed request.
#[derive(Debug)]
pub enum RemoteEvent {
    /// Result of [`RemoteClient::fetch`].
    Fetched(Result<String, RemoteError>),
    /// Result of [`RemoteClient::save`].
    Saved(Result<(), RemoteError>),
}

#[derive(Deserialize)]
struct TextBody {
    text: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Split stored text into catalog entries: one per non-empty trimmed line.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());
    Err(RemoteError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn fetch_text(client: &reqwest::blocking::Client, base: &str) -> Result<String, RemoteError> {
    let response = check(client.get(format!("{base}/text/get")).send()?)?;
    Ok(response.json::<TextBody>()?.text)
}

fn save_text(client: &reqwest::blocking::Client, base: &str, text: &str) -> Result<(), RemoteError> {
    check(
        client
            .post(format!("{base}/text/add"))
            .json(&serde_json::json!({ "text": text }))
            .send()?,
    )?;
    Ok(())
}

/// Text store client.
#[derive(Debug)]
pub struct RemoteClient {
    base_url: String,
    client: reqwest::blocking::Client,
    tx: Sender<RemoteEvent>,
    rx: Receiver<RemoteEvent>,
    in_flight: usize,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            tx,
            rx,
            in_flight: 0,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a request has not reported back yet.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Request the stored text.
    pub fn fetch(&mut self) {
        self.spawn(|client, base| RemoteEvent::Fetched(fetch_text(client, base)));
    }

    /// Replace the stored text.
    pub fn save(&mut self, text: String) {
        self.spawn(move |client, base| RemoteEvent::Saved(save_text(client, base, &text)));
    }

    /// Next finished request, if any.
    pub fn poll(&mut self) -> Option<RemoteEvent> {
        let event = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(event)
    }

    fn spawn<F>(&mut self, request: F)
    where
        F: FnOnce(&reqwest::blocking::Client, &str) -> RemoteEvent + Send + 'static,
    {
        let client = self.client.clone();
        let base = self.base_url.clone();
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let event = request(&client, &base);
            if let Err(e) = tx.send(event) {
                tracing::debug!("remote result dropped: {}", e);
            }
        });
    }
}
