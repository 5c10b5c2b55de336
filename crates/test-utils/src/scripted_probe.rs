use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use clusterlab::errors::ClusterlabError;
use clusterlab::verify::{HttpProbe, ProbeResponse};
use clusterlab::verify::probe::ProbeFuture;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Response(ProbeResponse),
    /// Transport-level failure (connection refused and the like).
    Unreachable(String),
}

/// An `HttpProbe` that plays back a fixed script of replies.
///
/// Once the script is exhausted every request is `Unreachable`. The number of
/// requests made is shared between clones so tests can inspect it after the
/// probe has been moved into a verifier.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProbe {
    script: VecDeque<Reply>,
    requests: Arc<Mutex<usize>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.script.push_back(reply);
        self
    }

    /// 200 whose body carries `JVM route: <route>`.
    pub fn route(self, route: &str) -> Self {
        self.status(200, &format!("Session\nJVM route: {route}\n"))
    }

    pub fn routes(self, route: &str, times: usize) -> Self {
        (0..times).fold(self, |p, _| p.route(route))
    }

    pub fn status(self, status: u16, body: &str) -> Self {
        self.reply(Reply::Response(ProbeResponse::new(status, body)))
    }

    pub fn statuses(self, status: u16, times: usize) -> Self {
        (0..times).fold(self, |p, _| p.status(status, "Service Unavailable"))
    }

    pub fn unreachable(self, reason: &str) -> Self {
        self.reply(Reply::Unreachable(reason.to_string()))
    }

    pub fn requests_made(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

impl HttpProbe for ScriptedProbe {
    fn get(&mut self) -> ProbeFuture<'_> {
        *self.requests.lock().unwrap() += 1;
        let next = self
            .script
            .pop_front()
            .unwrap_or_else(|| Reply::Unreachable("script exhausted".to_string()));

        Box::pin(async move {
            match next {
                Reply::Response(r) => Ok(r),
                Reply::Unreachable(reason) => Err(ClusterlabError::Other(anyhow!(reason))),
            }
        })
    }
}
