//! Allow-list authorization.
//!
//! Rules are `(subject, resource pattern, verb)` triples evaluated by casbin.
//! Public routes are granted to every subject at startup, account-wide rules
//! when a user registers, and per-resource rules when a post or comment is
//! created.

use casbin::{Adapter, CoreApi, DefaultModel, Enforcer, MgmtApi};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Subject pattern matching every caller, anonymous ones included.
pub const ANY_SUBJECT: &str = "*";

/// Subjects go through `keyMatch`, resources through `keyMatch5`: `{name}`
/// matches one path segment, `/*` the rest of the path, and the query string
/// is ignored.
pub const AUTH_MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = keyMatch(r.sub, p.sub) && keyMatch5(r.obj, p.obj) && r.act == p.act
"#;

const POLICY_SECTION: &str = "p";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Policy engine failed: {0}")]
    Engine(#[from] casbin::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub subject: String,
    pub resource: String,
    pub action: String,
}

impl Policy {
    pub fn new(subject: impl Into<String>, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            resource: resource.into(),
            action: action.into(),
        }
    }

    fn into_rule(self) -> Vec<String> {
        vec![self.subject, self.resource, self.action]
    }

    fn from_rule(rule: &[String]) -> Option<Self> {
        match rule {
            [subject, resource, action, ..] => Some(Self::new(subject.clone(), resource.clone(), action.clone())),
            _ => None,
        }
    }
}

/// Resource pattern for a path below the versioned API prefix.
pub fn api_resource(path: &str) -> String {
    format!("/api/{{version}}{}", path)
}

/// Rules every caller gets, signed in or not.
pub fn public_policies() -> Vec<Policy> {
    [
        ("/session", "POST"),
        ("/session", "DELETE"),
        ("/users/{username}", "POST"),
        ("/posts", "GET"),
        ("/posts/{postId}", "GET"),
        ("/posts/{postId}/comments", "GET"),
        ("/tags", "GET"),
    ]
    .into_iter()
    .map(|(path, verb)| Policy::new(ANY_SUBJECT, api_resource(path), verb))
    .collect()
}

/// Rules granted to a newly registered account.
pub fn user_default_policies(username: &str) -> Vec<Policy> {
    let own = |suffix: &str| format!("/users/{}/{}", username, suffix);
    [
        ("/posts/{postId}".to_string(), "POST"),
        ("/posts/{postId}/vote".to_string(), "PUT"),
        ("/posts/{postId}/vote".to_string(), "DELETE"),
        ("/comments/{commentId}".to_string(), "POST"),
        ("/comments/{commentId}/vote".to_string(), "PUT"),
        ("/comments/{commentId}/vote".to_string(), "DELETE"),
        (own("posts"), "GET"),
        (own("drafts"), "GET"),
        (own("liked-posts"), "GET"),
        (own("comments"), "GET"),
        (own("liked-comments"), "GET"),
    ]
    .into_iter()
    .map(|(path, verb)| Policy::new(username, api_resource(&path), verb))
    .collect()
}

pub fn post_owner_policies(username: &str, post_id: &str) -> Vec<Policy> {
    let post = api_resource(&format!("/posts/{}", post_id));
    vec![
        Policy::new(username, post.clone(), "PUT"),
        Policy::new(username, post.clone(), "DELETE"),
        Policy::new(username, format!("{}/conversion", post), "POST"),
    ]
}

pub fn comment_owner_policies(username: &str, comment_id: &str) -> Vec<Policy> {
    let comment = api_resource(&format!("/comments/{}", comment_id));
    vec![
        Policy::new(username, comment.clone(), "PUT"),
        Policy::new(username, comment, "DELETE"),
    ]
}

/// Shared handle the request pipeline and handlers use.
///
/// Grants hold the write lock from the duplicate check until the new rules
/// are stored, so concurrent grants never race each other.
#[derive(Clone)]
pub struct PolicyStore {
    enforcer: Arc<RwLock<Enforcer>>,
}

impl PolicyStore {
    /// Build the enforcer over `adapter` and load every stored rule.
    pub async fn open<A: Adapter + 'static>(adapter: A) -> Result<Self, PolicyError> {
        let model = DefaultModel::from_str(AUTH_MODEL).await?;
        let mut enforcer = Enforcer::new(model, adapter).await?;
        // Grants store only their own rules; see `grant`
        enforcer.enable_auto_save(false);
        Ok(Self {
            enforcer: Arc::new(RwLock::new(enforcer)),
        })
    }

    pub async fn is_allowed(&self, subject: &str, path: &str, verb: &str) -> Result<bool, PolicyError> {
        let path = path.split('?').next().unwrap_or(path);
        let enforcer = self.enforcer.read().await;
        Ok(enforcer.enforce((subject, path, verb))?)
    }

    /// Live set first, then durable storage. Only rules not already held are
    /// written. If the second step fails the grant stays active in memory until
    /// the next reload and the error is returned.
    pub async fn grant(&self, policies: Vec<Policy>) -> Result<(), PolicyError> {
        let mut enforcer = self.enforcer.write().await;

        let mut rules: Vec<Vec<String>> = Vec::new();
        for rule in policies.into_iter().map(Policy::into_rule) {
            if !rules.contains(&rule) && !enforcer.has_policy(rule.clone()) {
                rules.push(rule);
            }
        }
        if rules.is_empty() {
            return Ok(());
        }

        enforcer.add_policies(rules.clone()).await?;
        enforcer
            .get_mut_adapter()
            .add_policies(POLICY_SECTION, POLICY_SECTION, rules)
            .await?;
        Ok(())
    }

    /// Drop the live rule set and load it again from durable storage.
    pub async fn reload(&self) -> Result<(), PolicyError> {
        self.enforcer.write().await.load_policy().await?;
        Ok(())
    }

    /// Every rule currently enforced.
    pub async fn policies(&self) -> Vec<Policy> {
        let enforcer = self.enforcer.read().await;
        enforcer
            .get_policy()
            .iter()
            .filter_map(|rule| Policy::from_rule(rule))
            .collect()
    }

    pub async fn bootstrap(&self) -> Result<(), PolicyError> {
        self.grant(public_policies()).await
    }

    pub async fn grant_user_defaults(&self, username: &str) -> Result<(), PolicyError> {
        self.grant(user_default_policies(username)).await
    }

    pub async fn grant_post_owner(&self, username: &str, post_id: &str) -> Result<(), PolicyError> {
        self.grant(post_owner_policies(username, post_id)).await
    }

    pub async fn grant_comment_owner(&self, username: &str, comment_id: &str) -> Result<(), PolicyError> {
        self.grant(comment_owner_policies(username, comment_id)).await
    }
}
