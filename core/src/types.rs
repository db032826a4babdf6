//! Domain value types and wire DTOs for the Friendly API.
//!
//! # Design
//! Every string the API constrains is a newtype. `new` (and `FromStr`) run
//! the length check and are meant for local input. `From<String>` and
//! deserialization wrap the value as-is: server payloads are taken at face
//! value and only malformed JSON is a decode error.
//!
//! Two rules exist: free-text fields have an upper bound, while credentials
//! and hashes must be exactly `HASH_LEN` characters. Lengths are counted in
//! Unicode scalar values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const NICKNAME_MAX: usize = 256;
pub const DESCRIPTION_MAX: usize = 1024;
pub const INTEREST_MAX: usize = 64;

/// Exact length of tokens, friend tokens and access hashes.
pub const HASH_LEN: usize = 256;

/// Length rule attached to a validated string type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    AtMost(usize),
    Exactly(usize),
}

impl Limit {
    pub fn check(self, field: &'static str, value: &str) -> Result<(), ValidationError> {
        let actual = value.chars().count();
        match self {
            Limit::AtMost(max) if actual > max => Err(ValidationError::TooLong { field, max, actual }),
            Limit::Exactly(expected) if actual != expected => Err(ValidationError::WrongLength {
                field,
                expected,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

macro_rules! validated_string {
    ($(#[$meta:meta])* $name:ident, $field:literal, $limit:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const LIMIT: Limit = $limit;

            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                Self::LIMIT.check($field, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        /// Unchecked.
        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        /// Unchecked.
        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

validated_string!(
    /// User's display name. Not unique.
    Nickname,
    "nickname",
    Limit::AtMost(NICKNAME_MAX)
);
validated_string!(
    /// Free-form profile text.
    UserDescription,
    "description",
    Limit::AtMost(DESCRIPTION_MAX)
);
validated_string!(
    /// A single profile interest tag.
    Interest,
    "interest",
    Limit::AtMost(INTEREST_MAX)
);
validated_string!(
    /// Secret half of an `Authorization`, sent as `X-Token`.
    Token,
    "token",
    Limit::Exactly(HASH_LEN)
);
validated_string!(
    /// Opaque hash paired with a `UserId`. Knowing both is what lets a client
    /// address another user.
    UserAccessHash,
    "access hash",
    Limit::Exactly(HASH_LEN)
);
validated_string!(
    /// Opaque hash paired with a `FileId`.
    FileAccessHash,
    "file access hash",
    Limit::Exactly(HASH_LEN)
);
validated_string!(
    /// Token by which another user can add its issuer as a friend.
    FriendToken,
    "friend token",
    Limit::Exactly(HASH_LEN)
);

/// Unique identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub i64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credential presented on every authenticated call.
///
/// Returned by account generation and held by the caller for the session.
/// The client never refreshes it; an invalid one surfaces as
/// `ApiError::Unauthorized`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub id: UserId,
    pub access_hash: UserAccessHash,
    pub token: Token,
}

/// Handle to an uploaded file, used for avatars and download URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: FileId,
    pub access_hash: FileAccessHash,
}

/// Public profile of a user as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub id: UserId,
    pub access_hash: UserAccessHash,
    pub nickname: Nickname,
    pub description: UserDescription,
    #[serde(default)]
    pub interests: Vec<Interest>,
    #[serde(default)]
    pub avatar: Option<FileDescriptor>,
}

/// Snapshot of the caller's friend list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDetails {
    #[serde(default)]
    pub friends: Vec<UserDetails>,
}

/// One suggested connection in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub is_extended_network: bool,
    #[serde(default)]
    pub common_friends: Vec<UserDetails>,
    pub details: UserDetails,
}

/// Ordered feed, re-fetched wholesale on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedQueue {
    #[serde(default)]
    pub entries: Vec<FeedEntry>,
}

/// Request payload for account generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateAccount {
    pub nickname: Nickname,
    pub description: UserDescription,
    pub interests: Vec<Interest>,
    pub avatar: Option<FileDescriptor>,
}

/// Request payload for consuming a friend token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFriend {
    pub token: FriendToken,
    pub user_id: UserId,
}

/// Request payload shared by send-request and decline-request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub user_id: UserId,
    #[serde(rename = "userAccessHash")]
    pub access_hash: UserAccessHash,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GeneratedFriendToken {
    pub token: FriendToken,
}

/// Body of a 200 add-friend response, discriminated by its `type` field.
///
/// Only `FriendTokenExpired` carries meaning for the client. Any other tag,
/// a `null` tag or no tag at all is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AddFriendReply", into = "AddFriendReply")]
pub enum AddFriendOutcome {
    FriendTokenExpired,
    Success,
}

const FRIEND_TOKEN_EXPIRED: &str = "FriendTokenExpired";

#[derive(Serialize, Deserialize)]
struct AddFriendReply {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl From<AddFriendReply> for AddFriendOutcome {
    fn from(reply: AddFriendReply) -> Self {
        match reply.kind.as_deref() {
            Some(FRIEND_TOKEN_EXPIRED) => AddFriendOutcome::FriendTokenExpired,
            _ => AddFriendOutcome::Success,
        }
    }
}

impl From<AddFriendOutcome> for AddFriendReply {
    fn from(outcome: AddFriendOutcome) -> Self {
        let kind = match outcome {
            AddFriendOutcome::FriendTokenExpired => FRIEND_TOKEN_EXPIRED,
            AddFriendOutcome::Success => "Success",
        };
        AddFriendReply {
            kind: Some(kind.to_string()),
        }
    }
}
