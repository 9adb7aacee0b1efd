use std::error::Error;
use std::fmt;
use std::sync::Arc;

use stately_crypto::KeySource;
use stately_types::{Document, Metadata};
use tracing::{debug, error};

use crate::request::{parse_bool, StateRequest};

/// Query parameter holding the reference when no [`RefSource`] is set.
pub const DEFAULT_REF_PARAM: &str = "ref";
/// Query parameter holding the encrypt flag when no [`EncryptSource`] is set.
pub const DEFAULT_ENCRYPT_PARAM: &str = "encrypt";

/// Function deriving a value from an inbound request.
pub type Extract<T> = Arc<dyn Fn(&StateRequest) -> T + Send + Sync>;

/// Function deriving metadata from the plain state document on Put.
pub type MetadataSource = Arc<dyn Fn(&Document) -> Option<Metadata> + Send + Sync>;

/// Sink for protocol-level log events.
pub type Logger = Arc<dyn Fn(LogLevel, &str, Option<&(dyn Error + 'static)>) + Send + Sync>;

/// Severity passed to the [`Logger`] hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected conditions: conflicts, missing state on read, bad bodies.
    Debug,
    /// Storage and encryption failures.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// How the reference for a request is determined.
#[derive(Clone)]
pub enum RefSource {
    Fixed(String),
    Extract(Extract<String>),
}

/// Whether a Put should be encrypted.
#[derive(Clone)]
pub enum EncryptSource {
    Fixed(bool),
    Extract(Extract<bool>),
}

/// Hooks that customize the protocol handler.
///
/// Every hook is optional; unset hooks fall back to the defaults documented
/// on the resolve methods.
#[derive(Clone, Default)]
pub struct BackendOptions {
    pub ref_source: Option<RefSource>,
    pub encrypt_source: Option<EncryptSource>,
    pub encryption_key: Option<KeySource>,
    pub metadata_source: Option<MetadataSource>,
    pub logger: Option<Logger>,
}

impl BackendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ref_source(mut self, source: RefSource) -> Self {
        self.ref_source = Some(source);
        self
    }

    pub fn with_ref_extractor<F>(self, f: F) -> Self
    where
        F: Fn(&StateRequest) -> String + Send + Sync + 'static,
    {
        self.with_ref_source(RefSource::Extract(Arc::new(f)))
    }

    pub fn with_encrypt_source(mut self, source: EncryptSource) -> Self {
        self.encrypt_source = Some(source);
        self
    }

    pub fn with_encryption_key(mut self, key: KeySource) -> Self {
        self.encryption_key = Some(key);
        self
    }

    pub fn with_metadata<F>(mut self, f: F) -> Self
    where
        F: Fn(&Document) -> Option<Metadata> + Send + Sync + 'static,
    {
        self.metadata_source = Some(Arc::new(f));
        self
    }

    pub fn with_logger<F>(mut self, f: F) -> Self
    where
        F: Fn(LogLevel, &str, Option<&(dyn Error + 'static)>) + Send + Sync + 'static,
    {
        self.logger = Some(Arc::new(f));
        self
    }

    /// Reference for `request`. Default: the `ref` query parameter, or "".
    pub fn resolve_ref(&self, request: &StateRequest) -> String {
        match &self.ref_source {
            Some(RefSource::Extract(f)) => f(request),
            Some(RefSource::Fixed(reference)) => reference.clone(),
            None => request
                .query(DEFAULT_REF_PARAM)
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Encrypt flag for `request`. Default: the `encrypt` query parameter;
    /// missing or unparsable means `false`.
    pub fn resolve_encrypt(&self, request: &StateRequest) -> bool {
        match &self.encrypt_source {
            Some(EncryptSource::Extract(f)) => f(request),
            Some(EncryptSource::Fixed(flag)) => *flag,
            None => request
                .query(DEFAULT_ENCRYPT_PARAM)
                .and_then(parse_bool)
                .unwrap_or(false),
        }
    }

    /// Current key material. Empty when no key is configured.
    pub fn key_material(&self) -> Vec<u8> {
        self.encryption_key
            .as_ref()
            .map(KeySource::resolve)
            .unwrap_or_default()
    }

    /// Metadata to store next to `state`. Default: none.
    pub fn resolve_metadata(&self, state: &Document) -> Option<Metadata> {
        self.metadata_source.as_ref().and_then(|f| f(state))
    }

    /// Route an event to the logger hook, or to `tracing` when unset.
    pub fn log(&self, level: LogLevel, message: &str, err: Option<&(dyn Error + 'static)>) {
        match &self.logger {
            Some(logger) => logger(level, message, err),
            None => trace_sink(level, message, err),
        }
    }
}

fn trace_sink(level: LogLevel, message: &str, err: Option<&(dyn Error + 'static)>) {
    match (level, err) {
        (LogLevel::Debug, None) => debug!("{message}"),
        (LogLevel::Debug, Some(e)) => debug!(error = %e, "{message}"),
        (LogLevel::Error, None) => error!("{message}"),
        (LogLevel::Error, Some(e)) => error!(error = %e, "{message}"),
    }
}

impl fmt::Debug for BackendOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendOptions")
            .field("ref_source", &self.ref_source.as_ref().map(|_| "<hook>"))
            .field("encrypt_source", &self.encrypt_source.as_ref().map(|_| "<hook>"))
            .field("encryption_key", &self.encryption_key)
            .field("metadata_source", &self.metadata_source.as_ref().map(|_| "<fn>"))
            .field("logger", &self.logger.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method};
    use serde_json::json;
    use std::sync::Mutex;

    fn req(uri: &str) -> StateRequest {
        StateRequest::new(Method::POST, uri.parse().unwrap(), HeaderMap::new(), Bytes::new())
    }

    #[test]
    fn default_ref_from_query() {
        let opts = BackendOptions::new();
        assert_eq!(opts.resolve_ref(&req("/backend?ref=envA")), "envA");
        assert_eq!(opts.resolve_ref(&req("/backend")), "");
    }

    #[test]
    fn ref_hooks_take_precedence() {
        let fixed = BackendOptions::new().with_ref_source(RefSource::Fixed("pinned".into()));
        assert_eq!(fixed.resolve_ref(&req("/backend?ref=envA")), "pinned");

        let from_path = BackendOptions::new()
            .with_ref_extractor(|r| r.uri.path().trim_start_matches("/state/").to_string());
        assert_eq!(from_path.resolve_ref(&req("/state/team-a?ref=ignored")), "team-a");
    }

    #[test]
    fn encrypt_flag_resolution() {
        let opts = BackendOptions::new();
        assert!(opts.resolve_encrypt(&req("/backend?encrypt=true")));
        assert!(opts.resolve_encrypt(&req("/backend?encrypt=1")));
        assert!(!opts.resolve_encrypt(&req("/backend?encrypt=nope")));
        assert!(!opts.resolve_encrypt(&req("/backend")));

        let always = BackendOptions::new().with_encrypt_source(EncryptSource::Fixed(true));
        assert!(always.resolve_encrypt(&req("/backend?encrypt=false")));

        let by_header = BackendOptions::new().with_encrypt_source(EncryptSource::Extract(
            Arc::new(|r: &StateRequest| r.headers.contains_key("x-encrypt")),
        ));
        assert!(!by_header.resolve_encrypt(&req("/backend?encrypt=true")));
    }

    #[test]
    fn key_material_defaults_empty() {
        assert!(BackendOptions::new().key_material().is_empty());
        let opts = BackendOptions::new().with_encryption_key(KeySource::fixed("k"));
        assert_eq!(opts.key_material(), b"k".to_vec());
    }

    #[test]
    fn metadata_hook() {
        let mut state = Document::new();
        state.insert("serial".into(), json!(3));
        assert!(BackendOptions::new().resolve_metadata(&state).is_none());

        let opts = BackendOptions::new().with_metadata(|s| {
            let mut m = Metadata::new();
            m.insert("serial".into(), s.get("serial").cloned()?);
            Some(m)
        });
        assert_eq!(opts.resolve_metadata(&state).unwrap().get("serial"), Some(&json!(3)));
    }

    #[test]
    fn logger_hook_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let opts = BackendOptions::new().with_logger(move |level, message, err| {
            sink.lock()
                .unwrap()
                .push((level, message.to_string(), err.map(|e| e.to_string())));
        });
        let io = std::io::Error::other("disk gone");
        opts.log(LogLevel::Error, "failed", Some(&io));
        opts.log(LogLevel::Debug, "locked", None);
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], (LogLevel::Error, "failed".into(), Some("disk gone".into())));
        assert_eq!(seen[1], (LogLevel::Debug, "locked".into(), None));
    }

    #[test]
    fn debug_hides_key() {
        let opts = BackendOptions::new().with_encryption_key(KeySource::fixed("hunter2"));
        assert!(!format!("{opts:?}").contains("hunter2"));
    }
}
