//! In-process stand-in for a json-server `toDos` collection.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::Read;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Method, Response, Server};

pub struct FakeJsonServer {
    base_url: String,
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
    state: Arc<ServerState>,
}

struct ServerState {
    records: Mutex<Vec<Value>>,
    next_id: AtomicU64,
    failing: AtomicBool,
    requests: Mutex<Vec<String>>,
    list_reads: AtomicUsize,
}

impl FakeJsonServer {
    pub fn start(seed: Vec<Value>) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("http server"));
        let base_url = format!("http://{}", server.server_addr());
        let next_id = seed.len() as u64 + 1;
        let state = Arc::new(ServerState {
            records: Mutex::new(seed),
            next_id: AtomicU64::new(next_id),
            failing: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            list_reads: AtomicUsize::new(0),
        });

        let worker_server = Arc::clone(&server);
        let worker_state = Arc::clone(&state);
        let handle = thread::spawn(move || {
            for mut request in worker_server.incoming_requests() {
                let method = request.method().clone();
                let url = request.url().to_string();
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);

                let (status, payload) = worker_state.handle(&method, &url, &body);
                let response = Response::from_string(payload.to_string())
                    .with_status_code(status)
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json")
                            .expect("content type header"),
                    );
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            server,
            handle: Some(handle),
            state,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn records(&self) -> Vec<Value> {
        self.state.records.lock().expect("records lock").clone()
    }

    /// `"METHOD /path"` lines in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    pub fn list_reads(&self) -> usize {
        self.state.list_reads.load(Ordering::SeqCst)
    }

    /// Makes every following request answer `500`.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }
}

impl Drop for FakeJsonServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl ServerState {
    fn handle(&self, method: &Method, url: &str, body: &str) -> (u16, Value) {
        self.requests
            .lock()
            .expect("requests lock")
            .push(format!("{method} {url}"));
        if self.failing.load(Ordering::SeqCst) {
            return (500, json!({"error": "unavailable"}));
        }

        let segments: Vec<&str> = url.trim_matches('/').split('/').collect();
        let mut records = self.records.lock().expect("records lock");
        match (method, segments.as_slice()) {
            (Method::Get, ["toDos"]) => {
                self.list_reads.fetch_add(1, Ordering::SeqCst);
                (200, Value::Array(records.clone()))
            }
            (Method::Post, ["toDos"]) => {
                let mut record: Value = serde_json::from_str(body).unwrap_or(Value::Null);
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                record["id"] = json!(id);
                records.push(record.clone());
                (201, record)
            }
            (method, ["toDos", id]) => {
                let position = records.iter().position(|record| record_id(record) == *id);
                match (method, position) {
                    (_, None) => (404, json!({})),
                    (Method::Get, Some(index)) => (200, records[index].clone()),
                    (Method::Put, Some(index)) => {
                        let mut record: Value = serde_json::from_str(body).unwrap_or(Value::Null);
                        record["id"] = records[index]["id"].clone();
                        records[index] = record.clone();
                        (200, record)
                    }
                    (Method::Delete, Some(index)) => {
                        records.remove(index);
                        (200, json!({}))
                    }
                    _ => (405, json!({})),
                }
            }
            _ => (404, json!({})),
        }
    }
}

fn record_id(record: &Value) -> String {
    match &record["id"] {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    }
}
