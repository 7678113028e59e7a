//! Bucket targets: parse a bucket URL and hand out storage objects for keys.
//!
//! Supported forms:
//! - `http://host[:port]/<bucket>` and `https://...` (path-style S3-compatible)
//! - `s3://<bucket>` (endpoint from options, or the AWS endpoint for the region)
//! - `file:///path/to/bucket-dir`
//! - `mem://<bucket>`

use crate::error::{Error, Result};
use crate::objects::{FileObject, HttpObject, HttpSettings, MemoryStore, StorageObject};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Region used for `s3://` targets when none is given or derivable.
pub const DEFAULT_AWS_REGION: &str = "us-west-2";

/// Options that apply on top of the bucket URL.
#[derive(Debug, Clone, Default)]
pub struct TargetOptions {
    /// Service endpoint for `s3://` targets.
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub http: HttpSettings,
}

#[derive(Debug, Clone)]
enum Backend {
    Http { region: Option<String> },
    File { root: PathBuf },
    Memory(Arc<MemoryStore>),
}

/// A bucket in some backend. Cheap to clone; objects created from clones of a
/// `mem://` target share the same store.
#[derive(Debug, Clone)]
pub struct Target {
    protocol: String,
    endpoint: Url,
    bucket: String,
    http: HttpSettings,
    backend: Backend,
}

/// Parses `url_str`, failing if it is unparseable or has no scheme.
pub fn valid_abs_url(url_str: &str) -> Result<Url> {
    match Url::parse(url_str) {
        Ok(u) => Ok(u),
        Err(url::ParseError::RelativeUrlWithoutBase) => Err(Error::InvalidTarget {
            url: url_str.to_string(),
            reason: "URL must have a scheme".to_string(),
        }),
        Err(e) => Err(Error::InvalidTarget {
            url: url_str.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Extracts the region from legacy AWS endpoints such as
/// `https://s3-us-west-2.amazonaws.com` or `https://s3.eu-west-1.amazonaws.com`.
pub fn region_from_endpoint(endpoint: &Url) -> Option<String> {
    let host = endpoint.host_str()?;
    let rest = host.strip_suffix(".amazonaws.com")?;
    let region = rest
        .strip_prefix("s3-")
        .or_else(|| rest.strip_prefix("s3."))?;
    if region.is_empty() || region.contains('.') {
        return None;
    }
    Some(region.to_string())
}

impl Target {
    pub fn parse(bucket_url: &str, options: &TargetOptions) -> Result<Self> {
        let url = valid_abs_url(bucket_url)?;
        let invalid = |reason: &str| Error::InvalidTarget {
            url: bucket_url.to_string(),
            reason: reason.to_string(),
        };

        match url.scheme() {
            "http" | "https" => {
                let mut segments = url
                    .path_segments()
                    .map(|s| s.filter(|p| !p.is_empty()).collect::<Vec<_>>())
                    .unwrap_or_default();
                let bucket = segments.pop().ok_or_else(|| invalid("no bucket in URL path"))?;
                let bucket = percent_decode(bucket);
                let mut endpoint = url.clone();
                endpoint.set_query(None);
                endpoint.set_fragment(None);
                endpoint.set_path(&format!("{}/", segments.join("/")));
                let region = options
                    .region
                    .clone()
                    .or_else(|| region_from_endpoint(&endpoint));
                Ok(Self {
                    protocol: url.scheme().to_string(),
                    endpoint,
                    bucket,
                    http: options.http,
                    backend: Backend::Http { region },
                })
            }
            "s3" => {
                let bucket = url
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| invalid("s3 URL must name a bucket, e.g. s3://my-bucket"))?
                    .to_string();
                let endpoint_region = options
                    .endpoint
                    .as_deref()
                    .map(valid_abs_url)
                    .transpose()?;
                let region = options
                    .region
                    .clone()
                    .or_else(|| endpoint_region.as_ref().and_then(region_from_endpoint))
                    .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string());
                let endpoint = match endpoint_region {
                    Some(e) => e,
                    None => valid_abs_url(&format!("https://s3.{}.amazonaws.com/", region))?,
                };
                Ok(Self {
                    protocol: "s3".to_string(),
                    endpoint,
                    bucket,
                    http: options.http,
                    backend: Backend::Http {
                        region: Some(region),
                    },
                })
            }
            "file" => {
                let root = url
                    .to_file_path()
                    .map_err(|_| invalid("file URL must be an absolute local path"))?;
                let bucket = root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| invalid("file URL must name a directory"))?;
                Ok(Self {
                    protocol: "file".to_string(),
                    endpoint: url.clone(),
                    bucket,
                    http: options.http,
                    backend: Backend::File { root },
                })
            }
            "mem" => {
                let bucket = url
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| invalid("mem URL must name a bucket, e.g. mem://scratch"))?
                    .to_string();
                let store = MemoryStore::new(&bucket);
                Ok(Self {
                    protocol: "mem".to_string(),
                    endpoint: url.clone(),
                    bucket,
                    http: options.http,
                    backend: Backend::Memory(store),
                })
            }
            other => Err(invalid(&format!(
                "unsupported scheme '{}'; expected http, https, s3, file or mem",
                other
            ))),
        }
    }

    /// In-memory target backed by an existing store.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            protocol: "mem".to_string(),
            endpoint: store.endpoint().clone(),
            bucket: store.bucket().to_string(),
            http: HttpSettings::default(),
            backend: Backend::Memory(store),
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn region(&self) -> Option<&str> {
        match &self.backend {
            Backend::Http { region } => region.as_deref(),
            _ => None,
        }
    }

    /// Store behind a `mem://` target.
    pub fn memory_store(&self) -> Option<&Arc<MemoryStore>> {
        match &self.backend {
            Backend::Memory(store) => Some(store),
            _ => None,
        }
    }

    /// A fresh object instance for `key` with empty metadata caches.
    pub fn object(&self, key: &str) -> Result<Box<dyn StorageObject>> {
        let obj: Box<dyn StorageObject> = match &self.backend {
            Backend::Http { region } => Box::new(HttpObject::new(
                &self.protocol,
                self.endpoint.clone(),
                &self.bucket,
                key,
                region.clone(),
                self.http,
            )?),
            Backend::File { root } => Box::new(FileObject::new(
                self.endpoint.clone(),
                root.clone(),
                self.bucket.clone(),
                key,
            )),
            Backend::Memory(store) => Box::new(store.object(key)),
        };
        Ok(obj)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.bucket)
    }
}

fn percent_decode(segment: &str) -> String {
    url::form_urlencoded::parse(format!("x={}", segment.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| segment.to_string())
}
