//! Core domain for the GitHub Contents sync proxy.
//!
//! This crate contains every domain concept, newtype identifier, value type and
//! error type used by the proxy, the [`ContentsStore`] port that storage
//! backends implement, and the [`SyncProxy`] service that drives reads and
//! optimistic writes through it.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`FilePath`, `BlobSha`, `AccessToken`, etc.) |
//! | [`types`] | Value types (`RemoteFile`, `PutFile`, `CommitInfo`, `Timestamp`, etc.) |
//! | [`errors`] | The `SyncError` taxonomy |
//! | [`ports`] | The `ContentsStore` trait |
//! | [`service`] | `SyncProxy`: fetch and save |
//! | [`memory`] | In-memory `ContentsStore` for tests |

pub mod errors;
pub mod identifiers;
pub mod memory;
pub mod ports;
pub mod service;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::SyncError;
pub use identifiers::{
    AccessToken, BlobSha, BranchName, CommitSha, FilePath, RepositoryName, RepositoryOwner,
    RequestId,
};
pub use ports::ContentsStore;
pub use service::{SaveRequest, SyncProxy, SyncSettings};
pub use types::{
    encode_document, CommitInfo, CommitMessage, FileBlob, PutFile, RemoteFile, RepositoryTarget,
    Timestamp,
};
