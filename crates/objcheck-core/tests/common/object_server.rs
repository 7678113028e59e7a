//! Minimal HTTP/1.1 object server for integration tests.
//!
//! Stores request bodies by raw request path. Supports HEAD, Range GET, PUT
//! and DELETE; every response closes the connection.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ObjectServerOptions {
    /// If false, omit `Accept-Ranges: bytes` from HEAD responses.
    pub advertise_ranges: bool,
    /// If true, stored bodies have every byte inverted (simulates corruption).
    pub corrupt_uploads: bool,
    /// If true, PUT returns 403 and nothing is stored.
    pub read_only: bool,
    /// If true, DELETE returns 403 and the object is kept.
    pub forbid_delete: bool,
}

impl Default for ObjectServerOptions {
    fn default() -> Self {
        Self {
            advertise_ranges: true,
            corrupt_uploads: false,
            read_only: false,
            forbid_delete: false,
        }
    }
}

type Objects = Arc<Mutex<HashMap<String, Vec<u8>>>>;

pub struct ObjectServer {
    /// Base URL with trailing slash, e.g. `http://127.0.0.1:12345/`.
    pub url: String,
    objects: Objects,
}

impl ObjectServer {
    pub fn start() -> Self {
        Self::start_with_options(ObjectServerOptions::default())
    }

    pub fn start_with_options(opts: ObjectServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let objects: Objects = Arc::new(Mutex::new(HashMap::new()));
        let shared = Arc::clone(&objects);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let objects = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &objects, opts));
            }
        });
        Self {
            url: format!("http://127.0.0.1:{}/", port),
            objects,
        }
    }

    /// Bucket URL for `bucket` on this server.
    pub fn bucket_url(&self, bucket: &str) -> String {
        format!("{}{}", self.url, bucket)
    }

    pub fn put(&self, path: &str, body: Vec<u8>) {
        self.objects.lock().unwrap().insert(path.to_string(), body);
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

struct Request {
    method: String,
    path: String,
    range: Option<(u64, u64)>,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    let header_end = loop {
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    };

    let head = std::str::from_utf8(&data[..header_end]).ok()?.to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let mut content_length = 0usize;
    let mut range = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse().unwrap_or(0);
        } else if name.eq_ignore_ascii_case("range") {
            if let Some((a, b)) = value.strip_prefix("bytes=").and_then(|r| r.split_once('-')) {
                let start = a.trim().parse::<u64>().unwrap_or(0);
                let end = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                range = Some((start, end));
            }
        }
    }

    let mut body = data[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(content_length);

    Some(Request {
        method,
        path,
        range,
        body,
    })
}

fn respond(stream: &mut TcpStream, status: &str, headers: &[String], body: &[u8]) {
    let mut response = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status);
    for h in headers {
        response.push_str(h);
        response.push_str("\r\n");
    }
    response.push_str("\r\n");
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn handle(mut stream: TcpStream, objects: &Objects, opts: ObjectServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };

    match req.method.as_str() {
        "HEAD" => {
            let len = objects.lock().unwrap().get(&req.path).map(|b| b.len());
            match len {
                Some(len) => {
                    let mut headers = vec![format!("Content-Length: {}", len)];
                    if opts.advertise_ranges {
                        headers.push("Accept-Ranges: bytes".to_string());
                    }
                    headers.push("ETag: \"test\"".to_string());
                    respond(&mut stream, "200 OK", &headers, b"");
                }
                None => respond(&mut stream, "404 Not Found", &["Content-Length: 0".to_string()], b""),
            }
        }
        "GET" => {
            let body = objects.lock().unwrap().get(&req.path).cloned();
            let Some(body) = body else {
                respond(&mut stream, "404 Not Found", &["Content-Length: 0".to_string()], b"");
                return;
            };
            let total = body.len() as u64;
            match req.range {
                Some((start, end)) if start < total => {
                    let end = end.min(total - 1);
                    let slice = &body[start as usize..=end as usize];
                    let headers = vec![
                        format!("Content-Length: {}", slice.len()),
                        format!("Content-Range: bytes {}-{}/{}", start, end, total),
                    ];
                    respond(&mut stream, "206 Partial Content", &headers, slice);
                }
                Some(_) => {
                    let headers = vec![
                        "Content-Length: 0".to_string(),
                        format!("Content-Range: bytes */{}", total),
                    ];
                    respond(&mut stream, "416 Range Not Satisfiable", &headers, b"");
                }
                None => {
                    let headers = vec![format!("Content-Length: {}", total)];
                    respond(&mut stream, "200 OK", &headers, &body);
                }
            }
        }
        "PUT" => {
            if opts.read_only {
                let msg = b"<Error><Code>AccessDenied</Code></Error>";
                let headers = vec![format!("Content-Length: {}", msg.len())];
                respond(&mut stream, "403 Forbidden", &headers, msg);
                return;
            }
            let mut body = req.body;
            if opts.corrupt_uploads {
                body.iter_mut().for_each(|b| *b = !*b);
            }
            objects.lock().unwrap().insert(req.path, body);
            respond(&mut stream, "200 OK", &["Content-Length: 0".to_string()], b"");
        }
        "DELETE" => {
            if opts.forbid_delete {
                respond(&mut stream, "403 Forbidden", &["Content-Length: 0".to_string()], b"");
                return;
            }
            objects.lock().unwrap().remove(&req.path);
            respond(&mut stream, "204 No Content", &[], b"");
        }
        _ => respond(&mut stream, "405 Method Not Allowed", &["Content-Length: 0".to_string()], b""),
    }
}
