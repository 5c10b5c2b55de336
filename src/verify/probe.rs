// src/verify/probe.rs

//! Sequential HTTP probe used by the verifier.
//!
//! A probe is owned by exactly one verifier and issues one request at a time;
//! the session cookie set by the routing layer lives in its cookie jar and is
//! echoed on every following request.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Result<ProbeResponse>> + Send + 'a>>;

/// Status and body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

impl ProbeResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Issues GET requests against one fixed endpoint.
pub trait HttpProbe: Send {
    /// `Err` means the request could not be completed (connection refused,
    /// reset, ...); any HTTP status is an `Ok`.
    fn get(&mut self) -> ProbeFuture<'_>;
}

/// `reqwest` client with a cookie store.
pub struct ReqwestProbe {
    client: reqwest::Client,
    url: String,
}

impl ReqwestProbe {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl HttpProbe for ReqwestProbe {
    fn get(&mut self) -> ProbeFuture<'_> {
        Box::pin(async move {
            let response = self.client.get(&self.url).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(ProbeResponse { status, body })
        })
    }
}
