#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use agora_api::app::{self, AppState};
use agora_api::authz::PolicyStore;
use casbin::MemoryAdapter;
use agora_api::config::AppConfig;
use agora_api::database::models::{
    Comment, CommentStatus, NewComment, NewPost, NewUser, ParentSnapshot, Post, PostChanges, PostStatus, User,
    Vote, VoteTarget, VoteValue,
};
use agora_api::database::store::{CommentRepo, PostRepo, StoreResult, UserRepo, VoteRepo};
use agora_api::database::DatabaseError;
use agora_api::filter::{CommentFilter, PostFilter, SortBy};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const PASSWORD: &str = "Correct-Horse-9";
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.url = "postgres://unused".to_string();
    config.security.auth_secret_key = TEST_SECRET.to_string();
    config
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// In-memory store with the same observable rules as the Postgres one
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredPost {
    id: String,
    title: String,
    body: String,
    tags: Vec<String>,
    author: String,
    status: PostStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Clone)]
struct StoredComment {
    id: String,
    body: String,
    author: String,
    post_id: String,
    parent: Option<ParentSnapshot>,
    status: CommentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Default)]
struct Tables {
    users: HashMap<String, String>,
    posts: Vec<StoredPost>,
    comments: Vec<StoredComment>,
    votes: HashMap<(String, VoteTarget), VoteValue>,
    seq: u64,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn tally(&self, target: &VoteTarget, viewer: &str) -> (i64, i64, Option<VoteValue>) {
        let mut likes = 0;
        let mut dislikes = 0;
        for ((_, t), value) in &self.votes {
            if t == target {
                match value {
                    VoteValue::Like => likes += 1,
                    VoteValue::Dislike => dislikes += 1,
                }
            }
        }
        let mine = self.votes.get(&(viewer.to_string(), target.clone())).copied();
        (likes, dislikes, mine)
    }

    fn liked_by(&self, username: &str, target: &VoteTarget) -> bool {
        self.votes.get(&(username.to_string(), target.clone())) == Some(&VoteValue::Like)
    }

    fn post_view(&self, p: &StoredPost, viewer: &str) -> Post {
        let (likes, dislikes, user_vote) = self.tally(&VoteTarget::Post(p.id.clone()), viewer);
        Post {
            id: p.id.clone(),
            title: p.title.clone(),
            body: p.body.clone(),
            tags: p.tags.clone(),
            author: p.author.clone(),
            status: p.status,
            likes,
            dislikes,
            created_at: p.created_at,
            updated_at: p.updated_at,
            user_vote,
        }
    }

    fn comment_view(&self, c: &StoredComment, viewer: &str) -> Comment {
        let (likes, dislikes, user_vote) = self.tally(&VoteTarget::Comment(c.id.clone()), viewer);
        Comment {
            id: c.id.clone(),
            body: c.body.clone(),
            author: c.author.clone(),
            post_id: c.post_id.clone(),
            parent_comment: c.parent.clone(),
            status: c.status,
            likes,
            dislikes,
            created_at: c.created_at,
            updated_at: c.updated_at,
            user_vote,
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn has_duplicates(tags: &[String]) -> bool {
    let mut seen = std::collections::HashSet::new();
    tags.iter().any(|t| !seen.insert(t))
}

/// Newest-first unless the order says otherwise; ties broken newest first.
fn order<T>(rows: &mut [(T, u64, i64, usize)], sort_by: SortBy, by_overlap: bool) {
    rows.sort_by(|a, b| {
        let newest = b.1.cmp(&a.1);
        match sort_by {
            SortBy::Newest => newest,
            SortBy::Oldest => a.1.cmp(&b.1),
            SortBy::Popular => b.2.cmp(&a.2).then(newest),
            SortBy::Relevance if by_overlap => b.3.cmp(&a.3).then(newest),
            SortBy::Relevance => newest,
        }
    });
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    broken: AtomicBool,
}

impl MemoryStore {
    /// Make list reads fail the way a missing relation would.
    pub fn break_reads(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.broken.load(Ordering::SeqCst) {
            Err(DatabaseError::Query("relation \"post_tag\" does not exist".to_string()))
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<()> {
        let mut t = self.lock();
        if t.users.contains_key(&user.username) {
            return Err(DatabaseError::UniqueViolation("user_account_pkey".to_string()));
        }
        t.users.insert(user.username, user.password_hash);
        Ok(())
    }

    async fn get_user(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.get(username).map(|hash| User {
            username: username.to_string(),
            password_hash: hash.clone(),
        }))
    }
}

#[async_trait]
impl PostRepo for MemoryStore {
    async fn create_post(&self, post: NewPost) -> StoreResult<()> {
        let mut t = self.lock();
        if !t.users.contains_key(&post.author) {
            return Err(DatabaseError::InvalidForeignKey("post_author_fkey".to_string()));
        }
        if t.posts.iter().any(|p| p.id == post.id) {
            return Err(DatabaseError::UniqueViolation("post_pkey".to_string()));
        }
        if has_duplicates(&post.tags) {
            return Err(DatabaseError::UniqueViolation("post_tag_pkey".to_string()));
        }
        let seq = t.next_seq();
        let now = Utc::now();
        t.posts.push(StoredPost {
            id: post.id,
            title: post.title,
            body: post.body,
            tags: post.tags,
            author: post.author,
            status: post.status,
            created_at: now,
            updated_at: now,
            seq,
        });
        Ok(())
    }

    async fn get_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>> {
        self.check_reads()?;
        let t = self.lock();
        let mut rows: Vec<(Post, u64, i64, usize)> = t
            .posts
            .iter()
            .filter(|p| filter.id.as_ref().map_or(true, |id| &p.id == id))
            .filter(|p| filter.author.as_ref().map_or(true, |a| &p.author == a))
            .filter(|p| filter.statuses.is_empty() || filter.statuses.contains(&p.status))
            .filter(|p| {
                filter
                    .search
                    .as_ref()
                    .map_or(true, |q| contains_ci(&p.title, q) || contains_ci(&p.body, q))
            })
            .filter(|p| filter.tags.is_empty() || p.tags.iter().any(|tag| filter.tags.contains(&tag.to_lowercase())))
            .filter(|p| {
                filter
                    .liked_by
                    .as_ref()
                    .map_or(true, |u| t.liked_by(u, &VoteTarget::Post(p.id.clone())))
            })
            .map(|p| {
                let view = t.post_view(p, &filter.viewer);
                let net = view.likes - view.dislikes;
                let overlap = p.tags.iter().filter(|tag| filter.tags.contains(&tag.to_lowercase())).count();
                (view, p.seq, net, overlap)
            })
            .collect();

        order(&mut rows, filter.sort_by, filter.search.is_none() && !filter.tags.is_empty());
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn get_post(&self, viewer: &str, id: &str) -> StoreResult<Option<Post>> {
        let t = self.lock();
        Ok(t.posts.iter().find(|p| p.id == id).map(|p| t.post_view(p, viewer)))
    }

    async fn update_post(&self, changes: PostChanges) -> StoreResult<()> {
        if has_duplicates(&changes.tags) {
            return Err(DatabaseError::UniqueViolation("post_tag_pkey".to_string()));
        }
        let mut t = self.lock();
        let post = t
            .posts
            .iter_mut()
            .find(|p| p.id == changes.id && p.status != PostStatus::Deleted)
            .ok_or(DatabaseError::NotFound)?;
        post.title = changes.title;
        post.body = changes.body;
        post.tags = changes.tags;
        post.updated_at = Utc::now();
        Ok(())
    }

    async fn publish_draft(&self, changes: PostChanges) -> StoreResult<()> {
        if has_duplicates(&changes.tags) {
            return Err(DatabaseError::UniqueViolation("post_tag_pkey".to_string()));
        }
        let mut t = self.lock();
        let seq = t.next_seq();
        let post = t
            .posts
            .iter_mut()
            .find(|p| p.id == changes.id && p.status == PostStatus::Draft)
            .ok_or(DatabaseError::NotFound)?;
        let now = Utc::now();
        post.title = changes.title;
        post.body = changes.body;
        post.tags = changes.tags;
        post.status = PostStatus::Published;
        post.created_at = now;
        post.updated_at = now;
        post.seq = seq;
        Ok(())
    }

    async fn soft_delete_post(&self, id: &str) -> StoreResult<()> {
        let mut t = self.lock();
        let post = t
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.status != PostStatus::Deleted)
            .ok_or(DatabaseError::NotFound)?;
        post.title.clear();
        post.body.clear();
        post.tags.clear();
        post.status = PostStatus::Deleted;
        post.updated_at = Utc::now();
        Ok(())
    }

    async fn get_tags(&self) -> StoreResult<Vec<String>> {
        self.check_reads()?;
        let t = self.lock();
        let mut tags: Vec<String> = t.posts.iter().flat_map(|p| p.tags.iter().cloned()).collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn create_comment(&self, comment: NewComment) -> StoreResult<()> {
        let mut t = self.lock();
        if !t.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(DatabaseError::InvalidForeignKey("comment_post_id_fkey".to_string()));
        }
        if t.comments.iter().any(|c| c.id == comment.id) {
            return Err(DatabaseError::UniqueViolation("comment_pkey".to_string()));
        }
        let seq = t.next_seq();
        let now = Utc::now();
        t.comments.push(StoredComment {
            id: comment.id,
            body: comment.body,
            author: comment.author,
            post_id: comment.post_id,
            parent: comment.parent,
            status: CommentStatus::Published,
            created_at: now,
            updated_at: now,
            seq,
        });
        Ok(())
    }

    async fn get_comments(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>> {
        self.check_reads()?;
        let t = self.lock();
        let mut rows: Vec<(Comment, u64, i64, usize)> = t
            .comments
            .iter()
            .filter(|c| filter.id.as_ref().map_or(true, |id| &c.id == id))
            .filter(|c| filter.post_id.as_ref().map_or(true, |id| &c.post_id == id))
            .filter(|c| filter.author.as_ref().map_or(true, |a| &c.author == a))
            .filter(|c| filter.statuses.is_empty() || filter.statuses.contains(&c.status))
            .filter(|c| filter.search.as_ref().map_or(true, |q| contains_ci(&c.body, q)))
            .filter(|c| {
                filter
                    .liked_by
                    .as_ref()
                    .map_or(true, |u| t.liked_by(u, &VoteTarget::Comment(c.id.clone())))
            })
            .map(|c| {
                let view = t.comment_view(c, &filter.viewer);
                let net = view.likes - view.dislikes;
                (view, c.seq, net, 0)
            })
            .collect();

        order(&mut rows, filter.sort_by, false);
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn get_comment(&self, viewer: &str, id: &str) -> StoreResult<Option<Comment>> {
        let t = self.lock();
        Ok(t.comments.iter().find(|c| c.id == id).map(|c| t.comment_view(c, viewer)))
    }

    async fn update_comment(&self, id: &str, body: &str) -> StoreResult<()> {
        let mut t = self.lock();
        let comment = t
            .comments
            .iter_mut()
            .find(|c| c.id == id && c.status != CommentStatus::Deleted)
            .ok_or(DatabaseError::NotFound)?;
        comment.body = body.to_string();
        comment.updated_at = Utc::now();
        Ok(())
    }

    async fn soft_delete_comment(&self, id: &str) -> StoreResult<()> {
        let mut t = self.lock();
        let comment = t
            .comments
            .iter_mut()
            .find(|c| c.id == id && c.status != CommentStatus::Deleted)
            .ok_or(DatabaseError::NotFound)?;
        comment.body.clear();
        comment.status = CommentStatus::Deleted;
        comment.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl VoteRepo for MemoryStore {
    async fn upsert_vote(&self, vote: Vote) -> StoreResult<()> {
        let mut t = self.lock();
        let exists = match &vote.target {
            VoteTarget::Post(id) => t.posts.iter().any(|p| &p.id == id),
            VoteTarget::Comment(id) => t.comments.iter().any(|c| &c.id == id),
        };
        if !exists {
            return Err(DatabaseError::InvalidForeignKey("vote_target_fkey".to_string()));
        }
        t.votes.insert((vote.viewer, vote.target), vote.value);
        Ok(())
    }

    async fn delete_vote(&self, target: &VoteTarget, viewer: &str) -> StoreResult<()> {
        self.lock().votes.remove(&(viewer.to_string(), target.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Server harness
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub policies: PolicyStore,
    http: reqwest::Client,
}

/// Start the full router on a free local port, backed by in-memory storage.
pub async fn spawn_app() -> Result<TestApp> {
    let store = Arc::new(MemoryStore::default());
    let policies = PolicyStore::open(MemoryAdapter::default()).await?;
    policies.bootstrap().await?;

    let state = AppState::new(test_config(), store.clone(), policies.clone());

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(app::serve(listener, state));

    Ok(TestApp {
        base_url: format!("http://127.0.0.1:{}", port),
        store,
        policies,
        http: reqwest::Client::new(),
    })
}

impl TestApp {
    pub fn anonymous(&self) -> Caller<'_> {
        Caller { app: self, cookie: None }
    }

    pub fn raw(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    pub async fn register(&self, username: &str) -> Result<()> {
        let res = self
            .anonymous()
            .post(&format!("/users/{}", username))
            .json(&json!({ "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register {} failed: {}", username, res.status());
        Ok(())
    }

    pub async fn login(&self, username: &str) -> Result<Caller<'_>> {
        let res = self
            .anonymous()
            .post("/session")
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "login {} failed: {}", username, res.status());
        let cookie = session_cookie(&res).context("login did not set a cookie")?;
        Ok(Caller { app: self, cookie: Some(cookie) })
    }

    /// Register and log in.
    pub async fn user(&self, username: &str) -> Result<Caller<'_>> {
        self.register(username).await?;
        self.login(username).await
    }
}

/// `name=value` part of the first Set-Cookie header.
pub fn session_cookie(res: &Response) -> Option<String> {
    res.headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
}

pub struct Caller<'a> {
    app: &'a TestApp,
    pub cookie: Option<String>,
}

impl Caller<'_> {
    /// Request against `/api/v1{path}`, carrying the session cookie if any.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.app.raw(method, &format!("/api/v1{}", path));
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    pub async fn create_post(&self, title: &str, tags: &[&str], status: &str) -> Result<String> {
        let id = new_id();
        let res = self
            .post(&format!("/posts/{}", id))
            .json(&json!({ "title": title, "body": format!("{} body", title), "tags": tags, "status": status }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create post failed: {}", res.status());
        Ok(id)
    }

    pub async fn create_comment(&self, post_id: &str, body: &str, parent_id: Option<&str>) -> Result<String> {
        let id = new_id();
        let mut payload = json!({ "body": body, "postId": post_id });
        if let Some(parent) = parent_id {
            payload["parentId"] = json!(parent);
        }
        let res = self.post(&format!("/comments/{}", id)).json(&payload).send().await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create comment failed: {}", res.status());
        Ok(id)
    }

    pub async fn vote_post(&self, post_id: &str, vote: &str) -> Result<StatusCode> {
        let res = self
            .put(&format!("/posts/{}/vote", post_id))
            .json(&json!({ "vote": vote }))
            .send()
            .await?;
        Ok(res.status())
    }

    pub async fn json(&self, path: &str) -> Result<Value> {
        let res = self.get(path).send().await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "GET {} failed: {}", path, res.status());
        Ok(res.json().await?)
    }
}

/// Titles of a `{"posts": [...]}` body, in order.
pub fn titles(body: &Value) -> Vec<String> {
    body["posts"]
        .as_array()
        .map(|posts| posts.iter().filter_map(|p| p["title"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

/// Parse an error body and return `(code, message)`.
pub async fn error_body(res: Response) -> Result<(String, String)> {
    let body: Value = res.json().await?;
    Ok((
        body["code"].as_str().unwrap_or_default().to_string(),
        body["message"].as_str().unwrap_or_default().to_string(),
    ))
}
