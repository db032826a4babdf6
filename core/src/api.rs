//! Blocking facade over `FriendlyClient` and a `Transport`.
//!
//! # Design
//! Each method is build → execute → parse, one attempt, no retry. The
//! facade owns nothing mutable: the client holds the base URL and the
//! transport is shared, so a `Friendly` can be used from several threads at
//! once when its transport allows it.

use std::io::Read;

use crate::client::FriendlyClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Authorization, FeedQueue, FileDescriptor, FriendToken, GenerateAccount, Interest, NetworkDetails, Nickname,
    UserAccessHash, UserDescription, UserDetails, UserId,
};

/// Friendly API client that performs network I/O.
#[derive(Clone)]
pub struct Friendly<T = UreqTransport> {
    client: FriendlyClient,
    transport: T,
}

impl Friendly<UreqTransport> {
    pub fn new(base_url: &str) -> Self {
        Self::with_transport(FriendlyClient::new(base_url), UreqTransport::new())
    }

    pub fn localhost(port: u16) -> Self {
        Self::with_transport(FriendlyClient::localhost(port), UreqTransport::new())
    }

    pub fn production() -> Self {
        Self::with_transport(FriendlyClient::production(), UreqTransport::new())
    }
}

impl<T: Transport> Friendly<T> {
    pub fn with_transport(client: FriendlyClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &FriendlyClient {
        &self.client
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(&request)
    }

    /// Create an account and return the credentials for it.
    pub fn generate(
        &self,
        nickname: Nickname,
        description: UserDescription,
        interests: Vec<Interest>,
        avatar: Option<FileDescriptor>,
    ) -> Result<Authorization, ApiError> {
        let input = GenerateAccount {
            nickname,
            description,
            interests,
            avatar,
        };
        let response = self.execute(self.client.build_generate(&input)?)?;
        self.client.parse_generate(response)
    }

    pub fn get_self_details(&self, auth: &Authorization) -> Result<UserDetails, ApiError> {
        let response = self.execute(self.client.build_get_self_details(auth))?;
        self.client.parse_user_details(response)
    }

    /// Details of another user, as seen by `auth`'s owner.
    pub fn get_user_details(
        &self,
        auth: &Authorization,
        user_id: UserId,
        access_hash: &UserAccessHash,
    ) -> Result<UserDetails, ApiError> {
        let response = self.execute(self.client.build_get_user_details(auth, user_id, access_hash))?;
        self.client.parse_user_details(response)
    }

    pub fn generate_friend_token(&self, auth: &Authorization) -> Result<FriendToken, ApiError> {
        let response = self.execute(self.client.build_generate_friend_token(auth))?;
        self.client.parse_generate_friend_token(response)
    }

    /// Add the issuer of `token` (user `user_id`) as a friend.
    pub fn add_friend(&self, auth: &Authorization, token: &FriendToken, user_id: UserId) -> Result<(), ApiError> {
        let response = self.execute(self.client.build_add_friend(auth, token, user_id)?)?;
        self.client.parse_add_friend(response)
    }

    pub fn send_friend_request(
        &self,
        auth: &Authorization,
        user_id: UserId,
        access_hash: &UserAccessHash,
    ) -> Result<(), ApiError> {
        let response = self.execute(self.client.build_send_friend_request(auth, user_id, access_hash)?)?;
        self.client.parse_friend_request(response)
    }

    pub fn decline_friend_request(
        &self,
        auth: &Authorization,
        user_id: UserId,
        access_hash: &UserAccessHash,
    ) -> Result<(), ApiError> {
        let response = self.execute(self.client.build_decline_friend_request(auth, user_id, access_hash)?)?;
        self.client.parse_friend_request(response)
    }

    pub fn get_network_details(&self, auth: &Authorization) -> Result<NetworkDetails, ApiError> {
        let response = self.execute(self.client.build_get_network_details(auth))?;
        self.client.parse_network_details(response)
    }

    pub fn get_feed_queue(&self, auth: &Authorization) -> Result<FeedQueue, ApiError> {
        let response = self.execute(self.client.build_get_feed_queue(auth))?;
        self.client.parse_feed_queue(response)
    }

    /// Upload the full contents of `source` as a single-file multipart form.
    ///
    /// The source is read to completion before the request is sent.
    pub fn upload_file<R: Read>(
        &self,
        filename: &str,
        content_type: Option<&str>,
        mut source: R,
    ) -> Result<FileDescriptor, ApiError> {
        let mut data = Vec::new();
        source
            .read_to_end(&mut data)
            .map_err(|e| ApiError::Transport(format!("failed to read upload source: {e}")))?;
        let response = self.execute(self.client.build_upload_file(filename, content_type, &data))?;
        self.client.parse_upload_file(response)
    }

    pub fn file_url(&self, descriptor: &FileDescriptor) -> String {
        self.client.file_url(descriptor)
    }
}
