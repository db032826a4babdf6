//! Error types for the Friendly API client.
//!
//! # Design
//! `Unauthorized` and `NotFound` get dedicated variants because callers react
//! to them differently from "the server returned something unexpected": a
//! 401 means the stored `Authorization` is dead, a 404 on a friend request
//! means the target user does not exist. All other non-200 responses land in
//! `UnexpectedStatus` with the raw status code and body for debugging.
//!
//! `FriendTokenExpired` is the one business-level failure that arrives on a
//! 200 response. It is produced by decoding the add-friend body, never by
//! status inspection.

use thiserror::Error;

/// Errors returned by `FriendlyClient` parse methods and `Friendly` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response exists: DNS, connect, timeout, or request serialization
    /// failed before the server could answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server returned 401 for an authenticated call.
    #[error("unauthorized")]
    Unauthorized,

    /// The server returned 404 for a friend request or decline.
    #[error("user not found")]
    NotFound,

    /// The server returned a non-200 status that has no dedicated variant.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A 200 response body could not be decoded into the expected type.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The add-friend call succeeded at the HTTP level but the server
    /// reported the friend token as expired.
    #[error("friend token expired")]
    FriendTokenExpired,

    /// The multipart upload returned a non-200 status.
    #[error("upload failed with status {status}")]
    Upload { status: u16 },

    /// Local input validation failed before any request was built.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

/// A value rejected by one of the domain newtype constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} too long: {actual} > {max}")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} must be {expected} characters, got {actual}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}
