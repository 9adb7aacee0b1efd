use std::fmt;
use std::sync::Arc;

/// Where encryption key material comes from.
///
/// Either a fixed byte string or a function consulted on every use, so keys
/// can be rotated or fetched from the environment without restarting.
#[derive(Clone)]
pub enum KeySource {
    Static(Vec<u8>),
    Dynamic(Arc<dyn Fn() -> Vec<u8> + Send + Sync>),
}

impl KeySource {
    /// A fixed key.
    pub fn fixed(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Static(bytes.into())
    }

    /// A key produced by `f` each time it is needed.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn() -> Vec<u8> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Key material read from the environment variable `var` on every use.
    ///
    /// An unset variable resolves to empty material.
    pub fn from_env(var: impl Into<String>) -> Self {
        let var = var.into();
        Self::dynamic(move || {
            std::env::var_os(&var)
                .map(|v| v.into_encoded_bytes())
                .unwrap_or_default()
        })
    }

    /// Current key material. May be empty.
    pub fn resolve(&self) -> Vec<u8> {
        match self {
            Self::Static(bytes) => bytes.clone(),
            Self::Dynamic(f) => f(),
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => write!(f, "KeySource::Static(<redacted>)"),
            Self::Dynamic(_) => write!(f, "KeySource::Dynamic(<fn>)"),
        }
    }
}
