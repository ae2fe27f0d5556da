//! Minimal HTTP/1.1 stub server for driving the client in tests.
//!
//! One request per connection; every response closes the connection.
//! Routes match on method and path prefix, first match wins; anything
//! unmatched gets a 404.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use fairspace_testdata::{ApiConfig, FairspaceApi};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn new(method: &'static str, path: &'static str, status: u16, body: impl Into<String>) -> Self {
        Route {
            method,
            path,
            status,
            body: body.into(),
        }
    }
}

pub const TOKEN_PATH: &str = "/auth/realms/fairspace/protocol/openid-connect/token";

pub fn token_route(expires_in: u64) -> Route {
    Route::new(
        "POST",
        TOKEN_PATH,
        200,
        format!(r#"{{"access_token":"tok-1","expires_in":{expires_in},"token_type":"Bearer"}}"#),
    )
}

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    pub fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                if let Some(req) = handle(stream, &routes) {
                    recorded.lock().unwrap().push(req);
                }
            }
        });
        StubServer {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn matching(&self, method: &str, path_prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path.starts_with(path_prefix))
            .collect()
    }

    pub fn count(&self, method: &str, path_prefix: &str) -> usize {
        self.matching(method, path_prefix).len()
    }

    pub fn config(&self) -> ApiConfig {
        ApiConfig {
            url: self.base_url.clone(),
            keycloak_url: self.base_url.clone(),
            realm: "fairspace".into(),
            client_id: "workspace-client".into(),
            client_secret: "secret".into(),
            username: "organisation-admin".into(),
            password: "fairspace123".into(),
        }
    }

    pub fn api(&self) -> FairspaceApi {
        FairspaceApi::new(self.config()).unwrap()
    }
}

fn handle(stream: TcpStream, routes: &[Route]) -> Option<Recorded> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut h = String::new();
        reader.read_line(&mut h).ok()?;
        let h = h.trim_end();
        if h.is_empty() {
            break;
        }
        if let Some((k, v)) = h.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let header = |name: &str| {
        headers
            .iter()
            .find(|(k, _): &&(String, String)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    };
    let mut body = Vec::new();
    if let Some(len) = header("content-length").and_then(|v| v.parse::<usize>().ok()) {
        body.resize(len, 0);
        reader.read_exact(&mut body).ok()?;
    } else if header("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked")) {
        loop {
            let mut size_line = String::new();
            reader.read_line(&mut size_line).ok()?;
            let size = usize::from_str_radix(size_line.trim().split(';').next()?, 16).ok()?;
            if size == 0 {
                let mut end = String::new();
                reader.read_line(&mut end).ok()?;
                break;
            }
            let mut chunk = vec![0; size];
            reader.read_exact(&mut chunk).ok()?;
            body.extend_from_slice(&chunk);
            let mut crlf = String::new();
            reader.read_line(&mut crlf).ok()?;
        }
    }

    let route = routes
        .iter()
        .find(|r| r.method == method && path.starts_with(r.path));
    let (status, payload) = match route {
        Some(r) => (r.status, r.body.clone()),
        None => (404, String::new()),
    };
    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let mut stream = stream;
    stream.write_all(response.as_bytes()).ok()?;
    stream.flush().ok()?;

    Some(Recorded {
        method,
        path,
        headers,
        body,
    })
}
