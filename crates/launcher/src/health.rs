//! Liveness/readiness responder kept up while the launcher idles.
//!
//! Each `HealthServer` owns its listener; nothing is registered globally.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use tiny_http::{Request, Response, Server};

pub const READY_PATH: &str = "/isready";
pub const ALIVE_PATH: &str = "/isalive";
pub const READY_BODY: &str = "READY";
pub const ALIVE_BODY: &str = "ALIVE";

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("failed to bind health listener on {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },
    #[error("health listener on {addr} has no IP address")]
    NoAddr { addr: SocketAddr },
    #[error("failed to start health thread: {0}")]
    Thread(#[from] std::io::Error),
}

/// A bound but not yet serving listener.
pub struct HealthServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl HealthServer {
    pub fn bind(addr: SocketAddr) -> Result<Self, HealthError> {
        let server = Server::http(addr).map_err(|e| HealthError::Bind {
            addr,
            reason: e.to_string(),
        })?;
        let bound = match server.server_addr() {
            tiny_http::ListenAddr::IP(bound) => bound,
            #[cfg(not(target_os = "windows"))]
            _ => return Err(HealthError::NoAddr { addr }),
        };
        Ok(Self {
            server: Arc::new(server),
            addr: bound,
        })
    }

    /// Actual bound address (differs from the requested one when port 0 was asked for).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve on a background thread until the returned handle is dropped.
    pub fn spawn(self) -> Result<HealthHandle, HealthError> {
        let server = Arc::clone(&self.server);
        thread::Builder::new()
            .name("health".to_string())
            .spawn(move || serve(&server))?;
        tracing::info!(addr = %self.addr, "health endpoints up");
        Ok(HealthHandle {
            server: self.server,
            addr: self.addr,
        })
    }
}

/// Stops the responder on drop.
pub struct HealthHandle {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl HealthHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for HealthHandle {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

fn serve(server: &Server) {
    while let Ok(request) = server.recv() {
        respond(request);
    }
    tracing::debug!("health listener stopped");
}

fn respond(request: Request) {
    let (status, body) = route(request.url());
    tracing::debug!(method = %request.method(), url = request.url(), status, "health request");
    let response = Response::from_string(body).with_status_code(status);
    if let Err(err) = request.respond(response) {
        tracing::warn!(%err, "failed to answer health request");
    }
}

/// Match on the path alone; query strings and methods are ignored.
pub fn route(url: &str) -> (u16, &'static str) {
    let path = url.split_once('?').map_or(url, |(path, _)| path);
    match path {
        READY_PATH => (200, READY_BODY),
        ALIVE_PATH => (200, ALIVE_BODY),
        _ => (404, "not found"),
    }
}
