//! Shared test fixtures: an in-memory route table and loopback HTTP servers.

use crate::platform::{PlatformError, RouteTable};
use crate::routes::RouteOp;
use ipnet::Ipv4Net;
use std::cell::RefCell;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::TcpListener;

/// In-memory route table recording every operation.
///
/// `ops` is the full call sequence; `installed` models the resulting
/// routing table state (adds insert, deletes remove).
pub(crate) struct FakeRouteTable {
    pub ops: RefCell<Vec<(RouteOp, Ipv4Net, String)>>,
    pub installed: RefCell<HashSet<(Ipv4Net, String)>>,
    fail_dests: Vec<Ipv4Net>,
}

impl FakeRouteTable {
    pub fn new() -> Self {
        Self::failing_on(Vec::new())
    }

    /// A table that errors for the given destinations
    pub fn failing_on(fail_dests: Vec<Ipv4Net>) -> Self {
        Self {
            ops: RefCell::new(Vec::new()),
            installed: RefCell::new(HashSet::new()),
            fail_dests,
        }
    }
}

impl RouteTable for FakeRouteTable {
    fn add(&self, dest: &Ipv4Net, gateway: &str) -> Result<(), PlatformError> {
        if self.fail_dests.contains(dest) {
            return Err(PlatformError::AddRouteError("injected failure".to_string()));
        }
        self.ops
            .borrow_mut()
            .push((RouteOp::Add, *dest, gateway.to_string()));
        self.installed
            .borrow_mut()
            .insert((*dest, gateway.to_string()));
        Ok(())
    }

    fn delete(&self, dest: &Ipv4Net, gateway: &str) -> Result<(), PlatformError> {
        if self.fail_dests.contains(dest) {
            return Err(PlatformError::DeleteRouteError(
                "injected failure".to_string(),
            ));
        }
        self.ops
            .borrow_mut()
            .push((RouteOp::Delete, *dest, gateway.to_string()));
        self.installed
            .borrow_mut()
            .remove(&(*dest, gateway.to_string()));
        Ok(())
    }
}

/// Serve one HTTP 200 response with the given body on a loopback port
pub(crate) fn spawn_http(body: &'static str) -> String {
    spawn_http_response("200 OK", body)
}

/// Serve one HTTP response with the given status line and body
pub(crate) fn spawn_http_response(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}/", addr)
}

/// A loopback URL with nothing listening on it
pub(crate) fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}
