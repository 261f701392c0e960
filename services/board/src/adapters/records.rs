//! services/board/src/adapters/records.rs
//!
//! The persisted record format. Each collection is stored under its own key as a
//! versioned JSON document:
//!
//! ```text
//! users          {"version":1,"users":[{id,email,password,role,createdAt}, ...]}
//! posts          {"version":1,"posts":[{id,title,description,location,postedBy,role,imageUrl,createdAt}, ...]}
//! currentSession {"version":1,"session":{userId,role,email}}
//! ```
//!
//! Payloads written before versioning (a bare array, or a bare session object)
//! are migrated on load. Anything else that does not match the schema is rejected.

use chrono::{DateTime, SecondsFormat, Utc};
use lost_found_core::domain::{Post, PostId, PostKind, Role, Session, User, UserId};
use lost_found_core::ports::{PortError, PortResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt::Display;
use tracing::debug;

pub const USERS_KEY: &str = "users";
pub const POSTS_KEY: &str = "posts";
pub const SESSION_KEY: &str = "currentSession";

/// Version written by this build.
pub const SCHEMA_VERSION: u64 = 1;

//=========================================================================================
// "Impure" Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UserRecord {
    id: String,
    email: String,
    password: String,
    role: String,
    created_at: String,
}

impl UserRecord {
    fn from_domain(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            password: user.password.clone(),
            role: user.role.to_string(),
            created_at: format_timestamp(&user.created_at),
        }
    }

    fn to_domain(self) -> Result<User, String> {
        if self.id.is_empty() {
            return Err("user with empty id".to_string());
        }
        Ok(User {
            role: self.role.parse::<Role>().map_err(|e| e.to_string())?,
            created_at: parse_timestamp(&self.created_at)?,
            id: UserId::from(self.id),
            email: self.email,
            password: self.password,
        })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PostRecord {
    id: String,
    title: String,
    description: String,
    location: String,
    posted_by: String,
    role: String,
    image_url: String,
    created_at: String,
}

impl PostRecord {
    fn from_domain(post: &Post) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            description: post.description.clone(),
            location: post.location.clone(),
            posted_by: post.posted_by.to_string(),
            role: post.kind.to_string(),
            image_url: post.image_url.clone(),
            created_at: format_timestamp(&post.created_at),
        }
    }

    fn to_domain(self) -> Result<Post, String> {
        if self.id.is_empty() {
            return Err("post with empty id".to_string());
        }
        Ok(Post {
            kind: self.role.parse::<PostKind>().map_err(|e| e.to_string())?,
            created_at: parse_timestamp(&self.created_at)?,
            id: PostId::from(self.id),
            title: self.title,
            description: self.description,
            location: self.location,
            posted_by: UserId::from(self.posted_by),
            image_url: self.image_url,
        })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SessionRecord {
    user_id: String,
    role: String,
    email: String,
}

impl SessionRecord {
    fn from_domain(session: &Session) -> Self {
        Self {
            user_id: session.user_id.to_string(),
            role: session.role.to_string(),
            email: session.email.clone(),
        }
    }

    fn to_domain(self) -> Result<Session, String> {
        if self.user_id.is_empty() {
            return Err("session with empty userId".to_string());
        }
        Ok(Session {
            role: self.role.parse::<Role>().map_err(|e| e.to_string())?,
            user_id: UserId::from(self.user_id),
            email: self.email,
        })
    }
}

//=========================================================================================
// Encoding
//=========================================================================================

pub fn encode_users(users: &[User]) -> PortResult<String> {
    let records: Vec<UserRecord> = users.iter().map(UserRecord::from_domain).collect();
    to_json(USERS_KEY, json!({ "version": SCHEMA_VERSION, "users": records }))
}

pub fn encode_posts(posts: &[Post]) -> PortResult<String> {
    let records: Vec<PostRecord> = posts.iter().map(PostRecord::from_domain).collect();
    to_json(POSTS_KEY, json!({ "version": SCHEMA_VERSION, "posts": records }))
}

pub fn encode_session(session: &Session) -> PortResult<String> {
    let record = SessionRecord::from_domain(session);
    to_json(SESSION_KEY, json!({ "version": SCHEMA_VERSION, "session": record }))
}

fn to_json(key: &str, document: Value) -> PortResult<String> {
    serde_json::to_string(&document)
        .map_err(|e| PortError::Unexpected(format!("Failed to encode '{}': {}", key, e)))
}

//=========================================================================================
// Decoding
//=========================================================================================

pub fn decode_users(raw: &str) -> PortResult<Vec<User>> {
    let payload = open_document(USERS_KEY, raw, "users")?;
    let records: Vec<UserRecord> =
        serde_json::from_value(payload).map_err(|e| corrupt(USERS_KEY, e))?;

    let mut ids = HashSet::new();
    let mut emails = HashSet::new();
    let mut users = Vec::with_capacity(records.len());
    for record in records {
        let user = record.to_domain().map_err(|e| corrupt(USERS_KEY, e))?;
        if !ids.insert(user.id.clone()) {
            return Err(corrupt(USERS_KEY, format!("duplicate user id '{}'", user.id)));
        }
        if !emails.insert(user.email.clone()) {
            return Err(corrupt(USERS_KEY, format!("duplicate email '{}'", user.email)));
        }
        users.push(user);
    }
    Ok(users)
}

pub fn decode_posts(raw: &str) -> PortResult<Vec<Post>> {
    let payload = open_document(POSTS_KEY, raw, "posts")?;
    let records: Vec<PostRecord> =
        serde_json::from_value(payload).map_err(|e| corrupt(POSTS_KEY, e))?;

    let mut ids = HashSet::new();
    let mut posts = Vec::with_capacity(records.len());
    for record in records {
        let post = record.to_domain().map_err(|e| corrupt(POSTS_KEY, e))?;
        if !ids.insert(post.id.clone()) {
            return Err(corrupt(POSTS_KEY, format!("duplicate post id '{}'", post.id)));
        }
        posts.push(post);
    }
    Ok(posts)
}

pub fn decode_session(raw: &str) -> PortResult<Session> {
    let payload = open_document(SESSION_KEY, raw, "session")?;
    let record: SessionRecord =
        serde_json::from_value(payload).map_err(|e| corrupt(SESSION_KEY, e))?;
    record.to_domain().map_err(|e| corrupt(SESSION_KEY, e))
}

/// Parses the raw value and returns the collection payload, checking the version.
/// Documents without a `version` field are treated as the unversioned legacy layout.
fn open_document(key: &str, raw: &str, field: &str) -> PortResult<Value> {
    let document: Value = serde_json::from_str(raw).map_err(|e| corrupt(key, e))?;
    match document {
        Value::Object(mut map) if map.contains_key("version") => {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| corrupt(key, "version is not a number"))?;
            if version != SCHEMA_VERSION {
                return Err(corrupt(key, format!("unsupported schema version {}", version)));
            }
            map.remove(field)
                .ok_or_else(|| corrupt(key, format!("missing field '{}'", field)))
        }
        legacy => {
            debug!(key, "Migrating unversioned record");
            Ok(legacy)
        }
    }
}

fn corrupt(key: &str, reason: impl Display) -> PortError {
    PortError::Corrupt {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_user() -> User {
        User {
            id: UserId::generate(),
            email: "a@x.com".to_string(),
            password: "secret".to_string(),
            role: Role::Lost,
            created_at: Utc::now(),
        }
    }

    fn sample_post(author: &User) -> Post {
        Post {
            id: PostId::generate(),
            title: "Wallet".to_string(),
            description: "black leather".to_string(),
            location: "Main St".to_string(),
            posted_by: author.id.clone(),
            kind: PostKind::Lost,
            image_url: "data:image/png;base64,AAAA".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn users_and_posts_survive_encoding() {
        let user = sample_user();
        let post = sample_post(&user);

        let users = decode_users(&encode_users(&[user.clone()]).unwrap()).unwrap();
        let posts = decode_posts(&encode_posts(&[post.clone()]).unwrap()).unwrap();
        assert_eq!(users, vec![user]);
        assert_eq!(posts, vec![post]);
    }

    #[test]
    fn writes_camel_case_versioned_documents() {
        let user = sample_user();
        let encoded = encode_posts(&[sample_post(&user)]).unwrap();
        let document: Value = serde_json::from_str(&encoded).unwrap();

        assert_eq!(document["version"], json!(1));
        let post = &document["posts"][0];
        assert_eq!(post["postedBy"], json!(user.id.as_str()));
        assert_eq!(post["role"], json!("lost"));
        assert!(post.get("imageUrl").is_some());
        assert!(post.get("createdAt").is_some());

        let session = encode_session(&Session::from(&user)).unwrap();
        let document: Value = serde_json::from_str(&session).unwrap();
        assert_eq!(document["session"]["userId"], json!(user.id.as_str()));
    }

    #[test]
    fn migrates_legacy_arrays() {
        let raw = r#"[{"id":"1717000000000","email":"a@x.com","password":"secret","role":"found","createdAt":"2024-05-29T16:26:40.000Z"}]"#;
        let users = decode_users(raw).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, UserId::from("1717000000000"));
        assert_eq!(users[0].role, Role::Found);
        assert_eq!(
            users[0].created_at,
            Utc.with_ymd_and_hms(2024, 5, 29, 16, 26, 40).unwrap()
        );

        let session = decode_session(r#"{"userId":"1717000000000","role":"found","email":"a@x.com"}"#)
            .unwrap();
        assert_eq!(session.user_id, UserId::from("1717000000000"));
    }

    #[test]
    fn migrates_legacy_post_arrays() {
        let raw = r#"[{"id":"1717000001234","title":"Wallet","description":"black leather","location":"Main St","postedBy":"1717000000000","role":"lost","imageUrl":"","createdAt":"2024-05-29T16:26:41.000Z"}]"#;
        let posts = decode_posts(raw).unwrap();
        assert_eq!(posts.len(), 1);

        let post = &posts[0];
        assert_eq!(post.id, PostId::from("1717000001234"));
        assert_eq!(post.posted_by, UserId::from("1717000000000"));
        assert_eq!(post.kind, PostKind::Lost);
        assert_eq!(post.title, "Wallet");
        assert!(post.image_url.is_empty());
        assert_eq!(
            post.created_at,
            Utc.with_ymd_and_hms(2024, 5, 29, 16, 26, 41).unwrap()
        );

        // Re-encoding upgrades the record to the versioned layout.
        let document: Value = serde_json::from_str(&encode_posts(&posts).unwrap()).unwrap();
        assert_eq!(document["version"], json!(SCHEMA_VERSION));
        assert_eq!(document["posts"][0]["id"], json!("1717000001234"));
    }

    #[test]
    fn rejects_unknown_versions_and_shapes() {
        let unknown_version = r#"{"version":2,"posts":[]}"#;
        assert!(matches!(
            decode_posts(unknown_version),
            Err(PortError::Corrupt { ref key, .. }) if key == POSTS_KEY
        ));

        assert!(decode_posts("not json").is_err());
        assert!(decode_posts(r#"{"posts":[]}"#).is_err());
        assert!(decode_posts(r#"{"version":1}"#).is_err());

        let extra_field = r#"[{"id":"1","email":"a@x.com","password":"p","role":"lost","createdAt":"2024-05-29T16:26:40Z","admin":true}]"#;
        assert!(decode_users(extra_field).is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_role = r#"{"version":1,"session":{"userId":"1","role":"owner","email":"a@x.com"}}"#;
        assert!(decode_session(bad_role).is_err());

        let bad_time = r#"[{"id":"1","email":"a@x.com","password":"p","role":"lost","createdAt":"yesterday"}]"#;
        assert!(decode_users(bad_time).is_err());

        let admin_post = r#"[{"id":"1","title":"t","description":"d","location":"l","postedBy":"u","role":"admin","imageUrl":"","createdAt":"2024-05-29T16:26:40Z"}]"#;
        assert!(decode_posts(admin_post).is_err());
    }

    #[test]
    fn rejects_duplicates() {
        let same_email = r#"[
            {"id":"1","email":"a@x.com","password":"p","role":"lost","createdAt":"2024-05-29T16:26:40Z"},
            {"id":"2","email":"a@x.com","password":"q","role":"found","createdAt":"2024-05-29T16:26:41Z"}
        ]"#;
        let err = decode_users(same_email).unwrap_err();
        assert!(err.to_string().contains("duplicate email"));

        let same_id = r#"[
            {"id":"1","title":"t","description":"d","location":"l","postedBy":"u","role":"lost","imageUrl":"","createdAt":"2024-05-29T16:26:40Z"},
            {"id":"1","title":"t","description":"d","location":"l","postedBy":"u","role":"found","imageUrl":"","createdAt":"2024-05-29T16:26:40Z"}
        ]"#;
        assert!(decode_posts(same_id).is_err());
    }
}
