use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const NICKNAME_MAX: usize = 256;
pub const DESCRIPTION_MAX: usize = 1024;
pub const INTEREST_MAX: usize = 64;
pub const HASH_LEN: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: i64,
    pub access_hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub id: i64,
    pub access_hash: String,
    pub nickname: String,
    pub description: String,
    pub interests: Vec<String>,
    pub avatar: Option<FileDescriptor>,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub nickname: String,
    pub description: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub avatar: Option<FileDescriptor>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub id: i64,
    pub access_hash: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendTokenResponse {
    pub token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFriendRequest {
    pub token: String,
    pub user_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddFriendResponse {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub user_id: i64,
    pub user_access_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkDetails {
    pub friends: Vec<UserDetails>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub is_extended_network: bool,
    pub common_friends: Vec<UserDetails>,
    pub details: UserDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedQueue {
    pub entries: Vec<FeedEntry>,
}

struct User {
    details: UserDetails,
    token: String,
    friends: BTreeSet<i64>,
    /// Users who asked to befriend this one and are still waiting.
    incoming: BTreeSet<i64>,
}

struct StoredFile {
    access_hash: String,
    content_type: String,
    data: Vec<u8>,
}

#[derive(Default)]
pub struct Store {
    users: BTreeMap<i64, User>,
    /// Friend token -> issuing user. Removed on first use.
    friend_tokens: HashMap<String, i64>,
    files: BTreeMap<i64, StoredFile>,
    next_user_id: i64,
    next_file_id: i64,
}

impl Store {
    fn details(&self, ids: &BTreeSet<i64>) -> Vec<UserDetails> {
        ids.iter()
            .filter_map(|id| self.users.get(id))
            .map(|user| user.details.clone())
            .collect()
    }

    fn befriend(&mut self, a: i64, b: i64) {
        for (me, other) in [(a, b), (b, a)] {
            if let Some(user) = self.users.get_mut(&me) {
                user.friends.insert(other);
                user.incoming.remove(&other);
            }
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/auth/generate", post(generate))
        .route("/users/details", get(self_details))
        .route("/users/details/{id}/{access_hash}", get(user_details))
        .route("/friends/generate", post(generate_friend_token))
        .route("/friends/add", post(add_friend))
        .route("/friends/request", post(send_friend_request))
        .route("/friends/decline", post(decline_friend_request))
        .route("/network/details", get(network_details))
        .route("/feed/queue", get(feed_queue))
        .route("/files/upload", post(upload_file))
        .route("/files/download/{id}/{access_hash}", get(download_file))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// 256 random hex characters.
fn random_hash() -> String {
    (0..HASH_LEN / 32).map(|_| Uuid::new_v4().simple().to_string()).collect()
}

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

/// Resolve `X-User-Id` / `X-Token` to a known user id.
fn authenticate(store: &Store, headers: &HeaderMap) -> Result<i64, StatusCode> {
    let id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let token = headers
        .get("x-token")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    match store.users.get(&id) {
        Some(user) if user.token == token => Ok(id),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Look up another user, requiring the access hash to match.
fn lookup(store: &Store, id: i64, access_hash: &str) -> Result<i64, StatusCode> {
    match store.users.get(&id) {
        Some(user) if user.details.access_hash == access_hash => Ok(id),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn generate(
    State(db): State<Db>,
    Json(input): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    if too_long(&input.nickname, NICKNAME_MAX) {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "nickname too long".to_string()));
    }
    if too_long(&input.description, DESCRIPTION_MAX) {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "description too long".to_string()));
    }
    if input.interests.iter().any(|i| too_long(i, INTEREST_MAX)) {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "interest too long".to_string()));
    }

    let mut store = db.write().await;
    store.next_user_id += 1;
    let id = store.next_user_id;
    let access_hash = random_hash();
    let token = random_hash();
    store.users.insert(
        id,
        User {
            details: UserDetails {
                id,
                access_hash: access_hash.clone(),
                nickname: input.nickname,
                description: input.description,
                interests: input.interests,
                avatar: input.avatar,
            },
            token: token.clone(),
            friends: BTreeSet::new(),
            incoming: BTreeSet::new(),
        },
    );
    info!(user_id = id, "account generated");
    Ok(Json(GenerateResponse {
        id,
        access_hash,
        token,
    }))
}

async fn self_details(State(db): State<Db>, headers: HeaderMap) -> Result<Json<UserDetails>, StatusCode> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    store
        .users
        .get(&me)
        .map(|user| Json(user.details.clone()))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn user_details(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, access_hash)): Path<(i64, String)>,
) -> Result<Json<UserDetails>, StatusCode> {
    let store = db.read().await;
    authenticate(&store, &headers)?;
    let id = lookup(&store, id, &access_hash)?;
    store
        .users
        .get(&id)
        .map(|user| Json(user.details.clone()))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn generate_friend_token(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<FriendTokenResponse>, StatusCode> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    let token = random_hash();
    store.friend_tokens.insert(token.clone(), me);
    debug!(user_id = me, "friend token issued");
    Ok(Json(FriendTokenResponse { token }))
}

async fn add_friend(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<AddFriendRequest>,
) -> Result<Json<AddFriendResponse>, StatusCode> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;

    let issuer = store.friend_tokens.get(&input.token).copied();
    if issuer != Some(input.user_id) || input.user_id == me {
        return Ok(Json(AddFriendResponse {
            kind: "FriendTokenExpired".to_string(),
        }));
    }
    store.friend_tokens.remove(&input.token);
    store.befriend(me, input.user_id);
    info!(user_id = me, friend_id = input.user_id, "friend added by token");
    Ok(Json(AddFriendResponse {
        kind: "Success".to_string(),
    }))
}

async fn send_friend_request(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<FriendRequestBody>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    let target = lookup(&store, input.user_id, &input.user_access_hash)?;
    if target == me {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mutual = store.users.get(&me).is_some_and(|user| user.incoming.contains(&target));
    if mutual {
        store.befriend(me, target);
        info!(user_id = me, friend_id = target, "friend request accepted");
    } else if let Some(user) = store.users.get_mut(&target) {
        if !user.friends.contains(&me) {
            user.incoming.insert(me);
        }
    }
    Ok(StatusCode::OK)
}

async fn decline_friend_request(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<FriendRequestBody>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    let from = lookup(&store, input.user_id, &input.user_access_hash)?;
    let user = store.users.get_mut(&me).ok_or(StatusCode::UNAUTHORIZED)?;
    if user.incoming.remove(&from) {
        Ok(StatusCode::OK)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn network_details(State(db): State<Db>, headers: HeaderMap) -> Result<Json<NetworkDetails>, StatusCode> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    let friends = store
        .users
        .get(&me)
        .map(|user| store.details(&user.friends))
        .unwrap_or_default();
    Ok(Json(NetworkDetails { friends }))
}

/// Every other user who isn't already a friend, in id order. Users sharing
/// at least one friend with the caller are marked as extended network.
async fn feed_queue(State(db): State<Db>, headers: HeaderMap) -> Result<Json<FeedQueue>, StatusCode> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    let my_friends = store
        .users
        .get(&me)
        .map(|user| user.friends.clone())
        .unwrap_or_default();

    let entries = store
        .users
        .iter()
        .filter(|(id, _)| **id != me && !my_friends.contains(*id))
        .map(|(_, user)| {
            let common: BTreeSet<i64> = user.friends.intersection(&my_friends).copied().collect();
            FeedEntry {
                is_extended_network: !common.is_empty(),
                common_friends: store.details(&common),
                details: user.details.clone(),
            }
        })
        .collect();
    Ok(Json(FeedQueue { entries }))
}

async fn upload_file(State(db): State<Db>, mut multipart: Multipart) -> Result<Json<FileDescriptor>, StatusCode> {
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?.to_vec();

        let mut store = db.write().await;
        store.next_file_id += 1;
        let id = store.next_file_id;
        let access_hash = random_hash();
        debug!(file_id = id, bytes = data.len(), "file stored");
        store.files.insert(
            id,
            StoredFile {
                access_hash: access_hash.clone(),
                content_type,
                data,
            },
        );
        return Ok(Json(FileDescriptor { id, access_hash }));
    }
    Err(StatusCode::BAD_REQUEST)
}

async fn download_file(
    State(db): State<Db>,
    Path((id, access_hash)): Path<(i64, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = db.read().await;
    match store.files.get(&id) {
        Some(file) if file.access_hash == access_hash => {
            Ok(([(header::CONTENT_TYPE, file.content_type.clone())], file.data.clone()))
        },
        _ => Err(StatusCode::NOT_FOUND),
    }
}
