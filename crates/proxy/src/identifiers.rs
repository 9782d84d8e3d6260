//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging — for example —
//! a [`BlobSha`] with a [`CommitSha`] even though both are hex strings under the
//! hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single proxied HTTP request.
///
/// Generated fresh for every incoming request and recorded on its tracing span
/// so the read and the conditional write of one save can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (GitHub names and version tokens)
// ---------------------------------------------------------------------------

string_id! {
    /// The account or organisation that owns the target repository.
    RepositoryOwner
}

string_id! {
    /// The name of the target repository (without the owner prefix).
    RepositoryName
}

string_id! {
    /// A Git branch name (e.g. `"main"`).
    BranchName
}

string_id! {
    /// Version token of a file blob as reported by the Contents API.
    ///
    /// Opaque to the proxy: it is only ever echoed back on the next write to
    /// the same path so the backend can detect a stale update.
    BlobSha
}

string_id! {
    /// A Git commit SHA (40-character lowercase hex string).
    CommitSha
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// A file path relative to the repository root (e.g. `"data/coleccion.json"`).
///
/// The path ends up inside the Contents API URL, so construction rejects
/// anything that could address a different endpoint: a leading `/`, empty
/// segments, and `.` or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilePath(String);

impl FilePath {
    /// Creates a [`FilePath`], returning `None` if the value is not a plain
    /// repository-relative path.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() || v.starts_with('/') || v.contains('\\') {
            return None;
        }
        let valid = v
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if valid {
            Some(Self(v))
        } else {
            None
        }
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the `/`-separated segments of the path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for FilePath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value.clone()).ok_or_else(|| format!("invalid repository file path '{value}'"))
    }
}

impl From<FilePath> for String {
    fn from(path: FilePath) -> Self {
        path.0
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The server-held GitHub access token.
///
/// `Debug` is redacted and the type does not implement `Serialize`, so the
/// token never reaches logs or response bodies.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a token, returning `None` if the value is empty or whitespace.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the raw token for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_path_accepts_nested_relative_paths() {
        let path = FilePath::new("data/coleccion.json").unwrap();
        assert_eq!(path.as_str(), "data/coleccion.json");
        assert_eq!(path.segments().collect::<Vec<_>>(), ["data", "coleccion.json"]);
    }

    #[test]
    fn file_path_rejects_escaping_or_malformed_paths() {
        for bad in [
            "",
            "/etc/passwd",
            "../secrets.json",
            "data/../../x",
            "data//x.json",
            "./x.json",
            "data/",
            "data\\x.json",
        ] {
            assert!(FilePath::new(bad).is_none(), "expected '{bad}' to be rejected");
        }
    }

    #[test]
    fn file_path_deserialization_validates() {
        let ok: FilePath = serde_json::from_str("\"a/b.json\"").unwrap();
        assert_eq!(ok.as_str(), "a/b.json");
        assert!(serde_json::from_str::<FilePath>("\"../b.json\"").is_err());
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("ghp_secret").unwrap();
        assert_eq!(format!("{token:?}"), "AccessToken(***)");
        assert_eq!(token.expose(), "ghp_secret");
    }

    #[test]
    fn access_token_rejects_blank_values() {
        assert!(AccessToken::new("").is_none());
        assert!(AccessToken::new("   \n").is_none());
        assert_eq!(AccessToken::new(" tok \n").unwrap().expose(), "tok");
    }

    #[test]
    fn string_ids_reject_empty() {
        assert!(BranchName::new("").is_none());
        assert_eq!(BranchName::new("main").unwrap().to_string(), "main");
    }
}
