//! Synchronous client SDK for the Friendly social-networking API.
//!
//! # Overview
//! Wraps registration, profile lookup, friend management, feed browsing and
//! file upload behind typed requests and responses. Authenticated calls take
//! an `Authorization` returned by account generation.
//!
//! # Design
//! - `FriendlyClient` is stateless and I/O-free: `build_*` produces an
//!   `HttpRequest`, `parse_*` classifies an `HttpResponse`.
//! - `Transport` executes requests; `UreqTransport` is the blocking default
//!   with a fixed 30 second timeout.
//! - `Friendly` glues the two together, one method per endpoint.
//! - Domain strings are newtypes. `new` checks length limits on local input;
//!   response payloads are decoded as-is.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod multipart;
pub mod transport;
pub mod types;

pub use api::Friendly;
pub use client::{FriendlyClient, StatusPolicy};
pub use error::{ApiError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, TransportConfig, UreqTransport, DEFAULT_TIMEOUT};
pub use types::{
    AddFriend, AddFriendOutcome, Authorization, FeedEntry, FeedQueue, FileAccessHash, FileDescriptor, FileId,
    FriendRequest, FriendToken, GenerateAccount, Interest, NetworkDetails, Nickname, Token, UserAccessHash,
    UserDescription, UserDetails, UserId,
};
