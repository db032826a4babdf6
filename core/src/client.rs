//! Stateless HTTP request builder and response classifier for the Friendly API.
//!
//! # Design
//! `FriendlyClient` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Executing the round-trip is left to a `Transport`, so this
//! module is deterministic and never blocks.
//!
//! Every `parse_*` method runs the same routine: classify the status under a
//! `StatusPolicy`, then decode the JSON body. Only the policy and the result
//! type vary per endpoint.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::Form;
use crate::types::{
    AddFriend, AddFriendOutcome, Authorization, FeedQueue, FileDescriptor, FriendRequest, FriendToken,
    GenerateAccount, GeneratedFriendToken, NetworkDetails, UserAccessHash, UserDetails, UserId,
};

pub const PRODUCTION_URL: &str = "https://meetacy.app/friendly";

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const TOKEN_HEADER: &str = "X-Token";

const JSON: &str = "application/json";

/// Characters of a response body quoted in a `Decode` error.
const DECODE_BODY_PREVIEW: usize = 256;

/// Which non-200 statuses get a dedicated `ApiError` variant.
///
/// Anything not covered falls through to `ApiError::UnexpectedStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    pub unauthorized: bool,
    pub not_found: bool,
}

impl StatusPolicy {
    /// Unauthenticated endpoints: every failure is an unexpected status.
    pub const PUBLIC: Self = Self {
        unauthorized: false,
        not_found: false,
    };
    pub const AUTHENTICATED: Self = Self {
        unauthorized: true,
        not_found: false,
    };
    /// Send and decline friend request, where 404 means no such user or
    /// no pending request.
    pub const FRIEND_REQUEST: Self = Self {
        unauthorized: true,
        not_found: true,
    };
}

/// Synchronous, stateless client for the Friendly API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendlyClient {
    base_url: String,
}

impl FriendlyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn localhost(port: u16) -> Self {
        Self::new(&format!("http://localhost:{port}"))
    }

    pub fn production() -> Self {
        Self::new(PRODUCTION_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with no body.
    ///
    /// `Content-Type: application/json` is always set. When `auth` is present
    /// the user id and token travel as `X-User-Id` / `X-Token`.
    pub fn request(&self, method: HttpMethod, path: &str, auth: Option<&Authorization>) -> HttpRequest {
        let mut headers = vec![("content-type".to_string(), JSON.to_string())];
        if let Some(auth) = auth {
            headers.push((USER_ID_HEADER.to_string(), auth.id.to_string()));
            headers.push((TOKEN_HEADER.to_string(), auth.token.to_string()));
        }
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body: None,
        }
    }

    /// Build a request carrying `body` serialized as JSON.
    pub fn request_with_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        auth: Option<&Authorization>,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_vec(body).map_err(|e| ApiError::Transport(format!("failed to encode request body: {e}")))?;
        let mut req = self.request(method, path, auth);
        req.body = Some(body);
        Ok(req)
    }

    pub fn build_generate(&self, input: &GenerateAccount) -> Result<HttpRequest, ApiError> {
        self.request_with_json(HttpMethod::Post, "/auth/generate", None, input)
    }

    pub fn build_get_self_details(&self, auth: &Authorization) -> HttpRequest {
        self.request(HttpMethod::Get, "/users/details", Some(auth))
    }

    pub fn build_get_user_details(
        &self,
        auth: &Authorization,
        user_id: UserId,
        access_hash: &UserAccessHash,
    ) -> HttpRequest {
        let path = format!("/users/details/{user_id}/{access_hash}");
        self.request(HttpMethod::Get, &path, Some(auth))
    }

    pub fn build_generate_friend_token(&self, auth: &Authorization) -> HttpRequest {
        self.request(HttpMethod::Post, "/friends/generate", Some(auth))
    }

    pub fn build_add_friend(
        &self,
        auth: &Authorization,
        token: &FriendToken,
        user_id: UserId,
    ) -> Result<HttpRequest, ApiError> {
        let body = AddFriend {
            token: token.clone(),
            user_id,
        };
        self.request_with_json(HttpMethod::Post, "/friends/add", Some(auth), &body)
    }

    pub fn build_send_friend_request(
        &self,
        auth: &Authorization,
        user_id: UserId,
        access_hash: &UserAccessHash,
    ) -> Result<HttpRequest, ApiError> {
        self.friend_request("/friends/request", auth, user_id, access_hash)
    }

    pub fn build_decline_friend_request(
        &self,
        auth: &Authorization,
        user_id: UserId,
        access_hash: &UserAccessHash,
    ) -> Result<HttpRequest, ApiError> {
        self.friend_request("/friends/decline", auth, user_id, access_hash)
    }

    fn friend_request(
        &self,
        path: &str,
        auth: &Authorization,
        user_id: UserId,
        access_hash: &UserAccessHash,
    ) -> Result<HttpRequest, ApiError> {
        let body = FriendRequest {
            user_id,
            access_hash: access_hash.clone(),
        };
        self.request_with_json(HttpMethod::Post, path, Some(auth), &body)
    }

    pub fn build_get_network_details(&self, auth: &Authorization) -> HttpRequest {
        self.request(HttpMethod::Get, "/network/details", Some(auth))
    }

    pub fn build_get_feed_queue(&self, auth: &Authorization) -> HttpRequest {
        self.request(HttpMethod::Get, "/feed/queue", Some(auth))
    }

    /// Build the multipart upload request. The form has a single `file` field
    /// and the `Content-Type` header carries the form's boundary.
    pub fn build_upload_file(&self, filename: &str, content_type: Option<&str>, data: &[u8]) -> HttpRequest {
        let form = Form::new().file("file", filename, content_type, data);
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/files/upload", self.base_url),
            headers: vec![("content-type".to_string(), form.content_type())],
            body: Some(form.finish()),
        }
    }

    /// Download URL for an uploaded file. Pure string composition: the bytes
    /// are fetched by whoever consumes the URL.
    pub fn file_url(&self, descriptor: &FileDescriptor) -> String {
        format!(
            "{}/files/download/{}/{}",
            self.base_url, descriptor.id, descriptor.access_hash
        )
    }

    pub fn parse_generate(&self, response: HttpResponse) -> Result<Authorization, ApiError> {
        classify(&response, StatusPolicy::PUBLIC)
    }

    /// Shared by self and other-user detail lookups.
    pub fn parse_user_details(&self, response: HttpResponse) -> Result<UserDetails, ApiError> {
        classify(&response, StatusPolicy::AUTHENTICATED)
    }

    pub fn parse_generate_friend_token(&self, response: HttpResponse) -> Result<FriendToken, ApiError> {
        let generated: GeneratedFriendToken = classify(&response, StatusPolicy::AUTHENTICATED)?;
        Ok(generated.token)
    }

    pub fn parse_add_friend(&self, response: HttpResponse) -> Result<(), ApiError> {
        let outcome: AddFriendOutcome = classify(&response, StatusPolicy::AUTHENTICATED)?;
        match outcome {
            AddFriendOutcome::Success => Ok(()),
            AddFriendOutcome::FriendTokenExpired => Err(ApiError::FriendTokenExpired),
        }
    }

    /// Shared by send-request and decline-request. The body is ignored.
    pub fn parse_friend_request(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, StatusPolicy::FRIEND_REQUEST)
    }

    pub fn parse_network_details(&self, response: HttpResponse) -> Result<NetworkDetails, ApiError> {
        classify(&response, StatusPolicy::AUTHENTICATED)
    }

    pub fn parse_feed_queue(&self, response: HttpResponse) -> Result<FeedQueue, ApiError> {
        classify(&response, StatusPolicy::AUTHENTICATED)
    }

    pub fn parse_upload_file(&self, response: HttpResponse) -> Result<FileDescriptor, ApiError> {
        if response.status != 200 {
            return Err(ApiError::Upload {
                status: response.status,
            });
        }
        decode(&response)
    }
}

/// Check the status under `policy`, then decode the body as `T`.
pub fn classify<T: DeserializeOwned>(response: &HttpResponse, policy: StatusPolicy) -> Result<T, ApiError> {
    check_status(response, policy)?;
    decode(response)
}

/// Map non-200 status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, policy: StatusPolicy) -> Result<(), ApiError> {
    match response.status {
        200 => Ok(()),
        401 if policy.unauthorized => Err(ApiError::Unauthorized),
        404 if policy.not_found => Err(ApiError::NotFound),
        status => Err(ApiError::UnexpectedStatus {
            status,
            body: response.body.clone(),
        }),
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body)
        .map_err(|e| ApiError::Decode(format!("{e}, body: {}", preview(&response.body))))
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(DECODE_BODY_PREVIEW) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}
