//! Secret payload types.
//!
//! [`SecretString`] keeps private key PEM out of logs; [`StoredSecret`] is the
//! unit the store persists: typed data entries plus string annotations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Data key of a CA certificate
pub const CA_CERT_KEY: &str = "ca.crt";

/// Data key of a CA private key
pub const CA_PRIVATE_KEY: &str = "ca.key";

/// Data key of a leaf certificate
pub const TLS_CERT_KEY: &str = "tls.crt";

/// Data key of a leaf private key
pub const TLS_PRIVATE_KEY: &str = "tls.key";

/// A string wrapper that redacts its contents in Debug, Display, and serialization.
///
/// - Debug output shows `SecretString([REDACTED])`
/// - Display output shows `[REDACTED]`
/// - Serialization outputs `"[REDACTED]"`; stores must call
///   [`SecretString::expose_secret`] explicitly to persist the value
/// - Memory is zeroed on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretString(value))
    }
}

impl SecretString {
    /// Creates a new SecretString from a string value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying secret value.
    ///
    /// Only for signing, persisting or writing key files. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Returns the length of the secret without exposing the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the secret is empty or whitespace only.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// How downstream consumers should interpret a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecretType {
    /// Free-form key/value data (the CA bundle)
    Opaque,
    /// `tls.crt` / `tls.key` (+ `ca.crt`) bundle
    #[serde(rename = "kubernetes.io/tls")]
    Tls,
}

impl SecretType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opaque => "Opaque",
            Self::Tls => "kubernetes.io/tls",
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, namespaced bundle of secret data with annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSecret {
    pub name: String,
    pub namespace: String,
    pub secret_type: SecretType,
    pub data: BTreeMap<String, SecretString>,
    pub annotations: BTreeMap<String, String>,
    /// Version observed when loaded; `None` for secrets not yet persisted
    pub resource_version: Option<u64>,
}

impl StoredSecret {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        secret_type: SecretType,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            secret_type,
            data: BTreeMap::new(),
            annotations: BTreeMap::new(),
            resource_version: None,
        }
    }

    /// Add a data entry
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<SecretString>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Replace all annotations
    pub fn with_annotations(mut self, annotations: BTreeMap<String, String>) -> Self {
        self.annotations = annotations;
        self
    }

    /// The value stored under `key`, if present and non-empty
    pub fn value(&self, key: &str) -> Option<&SecretString> {
        self.data.get(key).filter(|value| !value.is_empty())
    }

    /// Whether `key` holds a non-empty value
    pub fn has_value(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Data keys that are missing or empty, from `required`
    pub fn missing_keys<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required.iter().copied().filter(|key| !self.has_value(key)).collect()
    }
}
