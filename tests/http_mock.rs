// tests/http_mock.rs
//
// Real HTTP round trips against an in-process axum server standing in for the
// routing layer: it sets a session cookie on the first request of a session
// and stamps `JVM route: <route>` on every body.

mod common;
use crate::common::{fakes, init_tracing, with_timeout};

use std::error::Error;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use clusterlab::load::{LoadOptions, run_load};
use clusterlab::verify::{
    Backend, DeploymentVerifier, HttpProbe, ReqwestProbe, VerifyOptions,
};

type TestResult = Result<(), Box<dyn Error>>;

#[derive(Clone, Default)]
struct Routing {
    /// `Cookie` header of every request, in arrival order.
    seen: Arc<Mutex<Vec<Option<String>>>>,
    /// Requests after which the session is served by `tomcat2`.
    failover_after: Option<usize>,
}

impl Routing {
    fn cookies(&self) -> Vec<Option<String>> {
        self.seen.lock().unwrap().clone()
    }
}

async fn jvmroute(State(routing): State<Routing>, headers: HeaderMap) -> Response {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let count = {
        let mut seen = routing.seen.lock().unwrap();
        seen.push(cookie.clone());
        seen.len()
    };

    let route = match routing.failover_after {
        Some(n) if count > n => "tomcat2",
        _ => "tomcat1",
    };
    let body = format!("Session served\nJVM route: {route}\n");

    if cookie.is_none() {
        let set = format!("JSESSIONID=abc.{route}; Path=/; HttpOnly");
        ([(header::SET_COOKIE, set)], body).into_response()
    } else {
        body.into_response()
    }
}

async fn persistent(State(routing): State<Routing>, headers: HeaderMap) -> Response {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    routing.seen.lock().unwrap().push(cookie);
    (
        [(header::SET_COOKIE, "id=1; Expires=Wed, 21 Oct 2037 07:28:00 GMT")],
        "JVM route: tomcat1\n",
    )
        .into_response()
}

async fn spawn_routing(routing: Routing) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new()
        .route("/clusterbench/jvmroute", get(jvmroute))
        .route("/persistent", get(persistent))
        .with_state(routing);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn reqwest_probe_echoes_the_session_cookie() -> TestResult {
    init_tracing();
    let routing = Routing::default();
    let addr = spawn_routing(routing.clone()).await;

    let mut probe = ReqwestProbe::new(format!("http://{addr}/clusterbench/jvmroute"))?;
    let first = probe.get().await?;
    let second = probe.get().await?;

    assert!(first.is_success());
    assert!(second.body.contains("JVM route: tomcat1"));
    assert_eq!(
        routing.cookies(),
        vec![None, Some("JSESSIONID=abc.tomcat1".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn verifier_passes_against_a_live_endpoint() -> TestResult {
    init_tracing();
    let routing = Routing {
        failover_after: Some(6),
        ..Routing::default()
    };
    let addr = spawn_routing(routing.clone()).await;
    let (runner, runner_dyn, fs, fs_dyn) = fakes();
    fs.add_file("/run/tomcat1.pid", "1234");

    let probe = ReqwestProbe::new(format!("http://{addr}/clusterbench/jvmroute"))?;
    let backends = vec![
        Backend::new("tomcat1", "tomcat1", "/run/tomcat1.pid"),
        Backend::new("tomcat2", "tomcat2", "/run/tomcat2.pid"),
    ];
    let options = VerifyOptions {
        interval: Duration::ZERO,
        ..VerifyOptions::default()
    };
    let mut verifier = DeploymentVerifier::new(probe, backends, options, runner_dyn, fs_dyn)?;

    let report = with_timeout(verifier.run()).await?;

    assert_eq!(report.bound_after_attempts, 1);
    assert_eq!(report.failover_route, "tomcat2");
    assert_eq!(runner.lines(), vec!["kill -9 1234"]);
    assert_eq!(routing.cookies().len(), 7);
    Ok(())
}

#[tokio::test]
async fn load_clients_hold_their_own_cookies() -> TestResult {
    init_tracing();
    let routing = Routing::default();
    let addr = spawn_routing(routing.clone()).await;

    let mut opts = LoadOptions::new(format!("http://{addr}/clusterbench/jvmroute"));
    opts.requests = 4;
    opts.clients = 3;
    opts.cookie_ttl = Duration::from_secs(3600);
    let stats = with_timeout(run_load(opts)).await?;

    assert_eq!(stats.len(), 3);
    for (idx, s) in stats.iter().enumerate() {
        assert_eq!(s.client, idx);
        assert_eq!(s.sent, 4);
        assert_eq!(s.failed, 0);
        assert_eq!(s.cookie_changes, 1);
        assert_eq!(s.expirations, 0);
    }

    let cookies = routing.cookies();
    assert_eq!(cookies.len(), 12);
    assert_eq!(cookies.iter().filter(|c| c.is_none()).count(), 3);
    Ok(())
}

#[tokio::test]
async fn expired_cookies_are_dropped_before_the_next_request() -> TestResult {
    init_tracing();
    let routing = Routing::default();
    let addr = spawn_routing(routing.clone()).await;

    let mut opts = LoadOptions::new(format!("http://{addr}/clusterbench/jvmroute"));
    opts.requests = 4;
    opts.cookie_ttl = Duration::from_micros(1);
    let stats = with_timeout(run_load(opts)).await?;

    assert_eq!(stats[0].expirations, 3);
    assert_eq!(stats[0].cookie_changes, 4);
    assert!(routing.cookies().iter().all(Option::is_none));
    Ok(())
}

#[tokio::test]
async fn persistent_cookies_are_not_sent_back() -> TestResult {
    init_tracing();
    let routing = Routing::default();
    let addr = spawn_routing(routing.clone()).await;

    let mut opts = LoadOptions::new(format!("http://{addr}/persistent"));
    opts.requests = 3;
    let stats = with_timeout(run_load(opts)).await?;

    assert_eq!(stats[0].sent, 3);
    assert_eq!(stats[0].cookie_changes, 0);
    assert_eq!(routing.cookies(), vec![None, None, None]);
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_counts_failures() -> TestResult {
    init_tracing();
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        listener.local_addr()?
    };

    let mut opts = LoadOptions::new(format!("http://{addr}/"));
    opts.requests = 2;
    let stats = with_timeout(run_load(opts)).await?;

    assert_eq!(stats[0].sent, 0);
    assert_eq!(stats[0].failed, 2);
    Ok(())
}
