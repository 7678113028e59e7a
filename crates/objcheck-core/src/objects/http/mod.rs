//! S3-compatible HTTP backend using libcurl.
//!
//! Objects are addressed path-style (`<endpoint>/<bucket>/<key>`). The path is
//! sent as built: `.` and `..` key segments are not resolved, so they name an
//! object rather than the bucket or a sibling. Requests are unsigned;
//! credentials, if any, are the endpoint's concern. Each object
//! owns one curl handle, its "session", which is reused across requests
//! until [`StorageObject::reset`].

mod head;

pub use head::HeadInfo;

use super::StorageObject;
use crate::error::{Error, Result};
use curl::easy::{Easy, List, ReadError};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::str;
use std::time::Duration;
use url::form_urlencoded;
use url::Url;

/// Bytes of an error response body kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 1024;

/// Transfer timeouts for the HTTP backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Abort if throughput stays below this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    /// Hard limit for a single request, in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            timeout_secs: 3600,
        }
    }
}

#[derive(Debug)]
pub struct HttpObject {
    protocol: String,
    endpoint: Url,
    object_url: String,
    bucket: String,
    key: String,
    region: Option<String>,
    settings: HttpSettings,
    session: Option<Easy>,
    head: Option<HeadInfo>,
}

impl HttpObject {
    /// Builds the object URL `<endpoint>/<bucket>/<key>`; `/` in the key
    /// separates path segments, everything else is percent-encoded.
    pub fn new(
        protocol: &str,
        endpoint: Url,
        bucket: &str,
        key: &str,
        region: Option<String>,
        settings: HttpSettings,
    ) -> Result<Self> {
        if endpoint.cannot_be_a_base() {
            return Err(Error::InvalidTarget {
                url: endpoint.to_string(),
                reason: "endpoint cannot be a base URL".to_string(),
            });
        }
        // Not `Url::path_segments_mut`: it resolves dot segments.
        let mut object_url = endpoint.as_str().trim_end_matches('/').to_string();
        for segment in std::iter::once(bucket).chain(key.split('/')) {
            object_url.push('/');
            object_url.push_str(&encode_segment(segment));
        }
        Ok(Self {
            protocol: protocol.to_string(),
            endpoint,
            object_url,
            bucket: bucket.to_string(),
            key: key.to_string(),
            region,
            settings,
            session: None,
            head: None,
        })
    }

    pub fn object_url(&self) -> &str {
        &self.object_url
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn uri(&self) -> String {
        format!("{}://{}/{}", self.protocol, self.bucket, self.key)
    }

    /// Returns the cached curl handle, reset to a clean request state.
    fn session(&mut self) -> Result<&mut Easy> {
        let settings = self.settings;
        let easy = self.session.get_or_insert_with(Easy::new);
        easy.reset();
        easy.url(&self.object_url)?;
        easy.path_as_is(true)?;
        easy.follow_location(true)?;
        easy.connect_timeout(Duration::from_secs(settings.connect_timeout_secs))?;
        easy.low_speed_limit(settings.low_speed_limit)?;
        easy.low_speed_time(Duration::from_secs(settings.low_speed_time_secs))?;
        easy.timeout(Duration::from_secs(settings.timeout_secs))?;
        Ok(easy)
    }

    /// HEAD the object, caching the result.
    fn head(&mut self) -> Result<&HeadInfo> {
        if self.head.is_none() {
            let uri = self.uri();
            let mut lines: Vec<String> = Vec::new();
            let easy = self.session()?;
            easy.nobody(true)?;
            {
                let mut transfer = easy.transfer();
                transfer.header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        lines.push(s.trim_end().to_string());
                    }
                    true
                })?;
                transfer.perform().map_err(|e| Error::Metadata {
                    uri: uri.clone(),
                    reason: e.to_string(),
                })?;
            }
            let code = easy.response_code()?;
            if !(200..300).contains(&code) {
                return Err(Error::Metadata {
                    uri,
                    reason: format!("HEAD returned HTTP {}", code),
                });
            }
            let info = head::parse_headers(&lines);
            tracing::debug!(
                "{}: HEAD content-length {:?}, etag {:?}, last-modified {:?}",
                uri,
                info.content_length,
                info.etag,
                info.last_modified
            );
            self.head = Some(info);
        }
        self.head
            .as_ref()
            .ok_or_else(|| Error::Backend("HEAD result missing".to_string()))
    }
}

/// Percent-encodes one path segment. Spaces become `%20`, not `+`.
fn encode_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn error_body_snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(body).trim().chars().take(200).collect()
}

impl StorageObject for HttpObject {
    fn protocol(&self) -> &str {
        &self.protocol
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn bucket(&self) -> Option<&str> {
        Some(self.bucket.as_str()).filter(|b| !b.is_empty())
    }

    fn key(&self) -> Option<&str> {
        Some(self.key.as_str()).filter(|k| !k.is_empty())
    }

    fn content_length(&mut self) -> Result<u64> {
        let uri = self.uri();
        match self.head() {
            Ok(info) => info.content_length.ok_or_else(|| Error::Metadata {
                uri,
                reason: "no content-length returned by HEAD".to_string(),
            }),
            Err(e) => {
                tracing::debug!("error determining content-length of {}: {}", uri, e);
                Err(e)
            }
        }
    }

    fn supports_ranges(&mut self) -> bool {
        match self.head() {
            Ok(info) if info.accept_ranges => true,
            Ok(_) => {
                tracing::debug!("range request may not be supported; no 'Accept-Ranges: bytes' header");
                false
            }
            Err(_) => false,
        }
    }

    fn read_range(&mut self, start: u64, end_inclusive: u64, buffer: &mut [u8]) -> Result<u64> {
        let uri = self.uri();
        let capacity = buffer.len();
        let mut filled = 0usize;
        let mut overflow = false;
        let easy = self.session()?;
        easy.get(true)?;
        easy.range(&format!("{}-{}", start, end_inclusive))?;
        let perform_result = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                if filled + data.len() > capacity {
                    overflow = true;
                    return Ok(0);
                }
                buffer[filled..filled + data.len()].copy_from_slice(data);
                filled += data.len();
                Ok(data.len())
            })?;
            transfer.perform()
        };
        if let Err(e) = perform_result {
            if overflow {
                return Err(Error::Backend(format!(
                    "{}: server returned more than the {} bytes requested for range {}-{}",
                    uri, capacity, start, end_inclusive
                )));
            }
            return Err(Error::Curl(e));
        }
        let code = easy.response_code()?;
        match code {
            206 => {}
            200 if start == 0 => {
                tracing::debug!("{}: server ignored Range header; accepted full body", uri)
            }
            _ => {
                return Err(Error::Http {
                    operation: "ranged GET",
                    status: code,
                })
            }
        }
        tracing::debug!("{}: read {} bytes for range {}-{}", uri, filled, start, end_inclusive);
        Ok(filled as u64)
    }

    fn stream_upload(&mut self, body: &mut dyn Read, length: u64) -> Result<()> {
        let uri = self.uri();
        let mut sent = 0u64;
        let mut body_error: Option<std::io::Error> = None;
        let mut response: Vec<u8> = Vec::new();
        let mut limited = body.take(length);

        let easy = self.session()?;
        easy.upload(true)?;
        easy.in_filesize(length)?;
        let mut list = List::new();
        // Disable "Expect: 100-continue" so small servers need not answer it.
        list.append("Expect:")?;
        list.append("Content-Type: application/octet-stream")?;
        easy.http_headers(list)?;

        let perform_result = {
            let mut transfer = easy.transfer();
            transfer.read_function(|into| match limited.read(into) {
                Ok(n) => {
                    sent += n as u64;
                    Ok(n)
                }
                Err(e) => {
                    body_error = Some(e);
                    Err(ReadError::Abort)
                }
            })?;
            transfer.write_function(|data| {
                let room = ERROR_BODY_LIMIT.saturating_sub(response.len());
                response.extend_from_slice(&data[..room.min(data.len())]);
                Ok(data.len())
            })?;
            transfer.perform()
        };

        if let Some(e) = body_error {
            return Err(Error::Io(e));
        }
        if sent < length {
            return Err(Error::ShortRead {
                expected: length,
                actual: sent,
            });
        }
        perform_result?;
        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            tracing::warn!(
                "upload to {} returned HTTP {}: {}",
                uri,
                code,
                error_body_snippet(&response)
            );
            return Err(Error::Http {
                operation: "PUT",
                status: code,
            });
        }
        self.head = None;
        tracing::debug!("upload of {} bytes to {} successful", length, uri);
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        let uri = self.uri();
        tracing::debug!("deleting {}", uri);
        let mut response: Vec<u8> = Vec::new();
        let easy = self.session()?;
        easy.custom_request("DELETE")?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                let room = ERROR_BODY_LIMIT.saturating_sub(response.len());
                response.extend_from_slice(&data[..room.min(data.len())]);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let code = easy.response_code()?;
        self.head = None;
        if !(200..300).contains(&code) {
            tracing::warn!(
                "delete of {} returned HTTP {}: {}",
                uri,
                code,
                error_body_snippet(&response)
            );
            return Err(Error::Http {
                operation: "DELETE",
                status: code,
            });
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.session = None;
        self.head = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(endpoint: &str, key: &str) -> HttpObject {
        HttpObject::new(
            "http",
            Url::parse(endpoint).unwrap(),
            "bucket",
            key,
            None,
            HttpSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn path_style_url() {
        let obj = object("http://127.0.0.1:9000/", "dir/file.bin");
        assert_eq!(obj.object_url(), "http://127.0.0.1:9000/bucket/dir/file.bin");
    }

    #[test]
    fn key_characters_are_encoded() {
        let obj = object("http://localhost/", "a b?c#d");
        assert_eq!(obj.object_url(), "http://localhost/bucket/a%20b%3Fc%23d");
        assert_eq!(obj.key(), Some("a b?c#d"));
    }

    #[test]
    fn endpoint_with_path_prefix() {
        let obj = object("http://localhost/storage/", "k");
        assert_eq!(obj.object_url(), "http://localhost/storage/bucket/k");
    }

    #[test]
    fn dot_segments_are_kept() {
        let base = "http://127.0.0.1:9000/";
        assert_eq!(object(base, "..").object_url(), "http://127.0.0.1:9000/bucket/..");
        assert_eq!(object(base, "./relative").object_url(), "http://127.0.0.1:9000/bucket/./relative");
        assert_eq!(object(base, "../parent").object_url(), "http://127.0.0.1:9000/bucket/../parent");
        assert_eq!(object(base, "a/../b").object_url(), "http://127.0.0.1:9000/bucket/a/../b");
        assert_eq!(object(base, "%2e%2e").object_url(), "http://127.0.0.1:9000/bucket/%252e%252e");
    }

    #[test]
    fn unicode_and_empty_segments() {
        let obj = object("http://localhost", "café//x+y");
        assert_eq!(obj.object_url(), "http://localhost/bucket/caf%C3%A9//x%2By");
    }

    #[test]
    fn reset_clears_session_and_metadata() {
        let mut obj = object("http://localhost/", "k");
        obj.session = Some(Easy::new());
        obj.head = Some(HeadInfo::default());
        obj.reset();
        assert!(obj.session.is_none());
        assert!(obj.head.is_none());
    }
}
