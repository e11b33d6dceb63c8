// Ent Privacy System - decides which mutations a caller may perform
// Denials are never errors: each one names the page the caller is sent to instead.

use std::collections::HashMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::entities::{PostId, UserId};
use crate::infrastructure::viewer::ViewerContext;

/// Operations guarded by the privacy policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivacyOperation {
    PostCreate,
    PostEdit,
    AddComment,
    ProfileFollow,
    ProfileUnfollow,
    FollowIndex,
}

/// Everything a rule may look at. Pure data, no store access.
#[derive(Debug, Clone)]
pub struct PrivacyContext<'a> {
    pub operation: PrivacyOperation,
    pub viewer: &'a ViewerContext,
    /// Owner of the target resource, when it has one.
    pub owner_id: Option<UserId>,
    /// Target post, for post-scoped operations.
    pub post_id: Option<PostId>,
    /// Path and query of the current request, used as the login `next`.
    pub request_path: &'a str,
}

/// Where a denied caller is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    ToIndex,
    ToLogin,
    ToPostDetail(PostId),
}

/// Privacy rule result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivacyResult {
    Allow,
    Deny(Denial),
    Skip, // Skip this rule, continue to next
}

/// Outcome of evaluating the policy for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivacyDecision {
    Allow,
    Redirect(String),
}

impl PrivacyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PrivacyDecision::Allow)
    }
}

/// Trait for implementing privacy rules
pub trait PrivacyRule: Send + Sync {
    fn evaluate(&self, ctx: &PrivacyContext<'_>) -> PrivacyResult;

    /// Get rule name for debugging
    fn name(&self) -> &str;

    /// Get rule priority (higher = evaluated first)
    fn priority(&self) -> i32;
}

/// Anonymous callers are sent elsewhere; authenticated ones pass through.
pub struct AnonymousRedirectRule {
    denial: Denial,
}

impl AnonymousRedirectRule {
    pub fn to_login() -> Self {
        Self {
            denial: Denial::ToLogin,
        }
    }

    pub fn to_index() -> Self {
        Self {
            denial: Denial::ToIndex,
        }
    }
}

impl PrivacyRule for AnonymousRedirectRule {
    fn evaluate(&self, ctx: &PrivacyContext<'_>) -> PrivacyResult {
        if ctx.viewer.is_authenticated() {
            PrivacyResult::Skip
        } else {
            PrivacyResult::Deny(self.denial.clone())
        }
    }

    fn name(&self) -> &str {
        "anonymous_redirect"
    }

    fn priority(&self) -> i32 {
        200
    }
}

/// Only the resource owner may continue; others go back to the post page.
pub struct AuthorOnlyRule;

impl PrivacyRule for AuthorOnlyRule {
    fn evaluate(&self, ctx: &PrivacyContext<'_>) -> PrivacyResult {
        match (ctx.owner_id, ctx.viewer.user_id()) {
            (Some(owner_id), Some(user_id)) if owner_id == user_id => PrivacyResult::Skip,
            _ => match ctx.post_id {
                Some(post_id) => PrivacyResult::Deny(Denial::ToPostDetail(post_id)),
                None => PrivacyResult::Deny(Denial::ToIndex),
            },
        }
    }

    fn name(&self) -> &str {
        "author_only"
    }

    fn priority(&self) -> i32 {
        100
    }
}

/// Lowest-priority allow for any authenticated caller.
pub struct AuthenticatedRule;

impl PrivacyRule for AuthenticatedRule {
    fn evaluate(&self, ctx: &PrivacyContext<'_>) -> PrivacyResult {
        if ctx.viewer.is_authenticated() {
            PrivacyResult::Allow
        } else {
            PrivacyResult::Skip
        }
    }

    fn name(&self) -> &str {
        "authenticated"
    }

    fn priority(&self) -> i32 {
        0
    }
}

/// Privacy rules per operation plus where login lives
pub struct PrivacyPolicy {
    login_url: String,
    rules: HashMap<PrivacyOperation, Vec<Box<dyn PrivacyRule>>>,
}

impl PrivacyPolicy {
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
            rules: HashMap::new(),
        }
    }

    /// The blog's rule set.
    pub fn standard(login_url: impl Into<String>) -> Self {
        let mut policy = Self::new(login_url);

        policy.register_rule(PrivacyOperation::PostCreate, Box::new(AnonymousRedirectRule::to_index()));
        policy.register_rule(PrivacyOperation::PostCreate, Box::new(AuthenticatedRule));

        policy.register_rule(PrivacyOperation::PostEdit, Box::new(AnonymousRedirectRule::to_login()));
        policy.register_rule(PrivacyOperation::PostEdit, Box::new(AuthorOnlyRule));
        policy.register_rule(PrivacyOperation::PostEdit, Box::new(AuthenticatedRule));

        for operation in [
            PrivacyOperation::AddComment,
            PrivacyOperation::ProfileFollow,
            PrivacyOperation::ProfileUnfollow,
            PrivacyOperation::FollowIndex,
        ] {
            policy.register_rule(operation, Box::new(AnonymousRedirectRule::to_login()));
            policy.register_rule(operation, Box::new(AuthenticatedRule));
        }

        policy
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn register_rule(&mut self, operation: PrivacyOperation, rule: Box<dyn PrivacyRule>) {
        let rules = self.rules.entry(operation).or_default();
        rules.push(rule);
        // Sort by priority (highest first)
        rules.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    pub fn evaluate(&self, ctx: &PrivacyContext<'_>) -> PrivacyDecision {
        let rules = self.rules.get(&ctx.operation).map(Vec::as_slice).unwrap_or_default();
        for rule in rules {
            match rule.evaluate(ctx) {
                PrivacyResult::Allow => return PrivacyDecision::Allow,
                PrivacyResult::Deny(denial) => {
                    tracing::debug!(
                        rule = rule.name(),
                        operation = ?ctx.operation,
                        request_id = %ctx.viewer.request_id,
                        "Privacy rule denied"
                    );
                    return PrivacyDecision::Redirect(self.denial_target(&denial, ctx));
                }
                PrivacyResult::Skip => continue,
            }
        }

        // Default to login if no rule explicitly allows
        PrivacyDecision::Redirect(self.denial_target(&Denial::ToLogin, ctx))
    }

    fn denial_target(&self, denial: &Denial, ctx: &PrivacyContext<'_>) -> String {
        match denial {
            Denial::ToIndex => "/".to_string(),
            Denial::ToLogin => login_redirect(&self.login_url, ctx.request_path),
            Denial::ToPostDetail(post_id) => format!("/posts/{}/", post_id),
        }
    }
}

/// Characters escaped in the `next` parameter; slashes stay readable.
const NEXT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// `<login_url>?next=<path>` with the path percent-encoded, slashes kept.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!("{}{}next={}", login_url, separator, utf8_percent_encode(next, NEXT_SET))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntUser;
    use chrono::Utc;

    fn user(id: UserId) -> ViewerContext {
        ViewerContext::authenticated_user(
            EntUser {
                id,
                username: format!("user{}", id),
                date_joined: Utc::now(),
            },
            "req-test".to_string(),
        )
    }

    fn anonymous() -> ViewerContext {
        ViewerContext::anonymous("req-test".to_string())
    }

    fn ctx<'a>(
        operation: PrivacyOperation,
        viewer: &'a ViewerContext,
        owner_id: Option<UserId>,
        request_path: &'a str,
    ) -> PrivacyContext<'a> {
        PrivacyContext {
            operation,
            viewer,
            owner_id,
            post_id: Some(7),
            request_path,
        }
    }

    #[test]
    fn test_anonymous_create_goes_to_index() {
        let policy = PrivacyPolicy::standard("/");
        let viewer = anonymous();
        let decision = policy.evaluate(&ctx(PrivacyOperation::PostCreate, &viewer, None, "/create/"));
        assert_eq!(decision, PrivacyDecision::Redirect("/".to_string()));
    }

    #[test]
    fn test_authenticated_create_allowed() {
        let policy = PrivacyPolicy::standard("/");
        let viewer = user(1);
        let decision = policy.evaluate(&ctx(PrivacyOperation::PostCreate, &viewer, None, "/create/"));
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_edit_by_non_author_goes_to_detail() {
        let policy = PrivacyPolicy::standard("/");
        let viewer = user(2);
        let decision = policy.evaluate(&ctx(PrivacyOperation::PostEdit, &viewer, Some(1), "/posts/7/edit/"));
        assert_eq!(decision, PrivacyDecision::Redirect("/posts/7/".to_string()));
    }

    #[test]
    fn test_edit_by_author_allowed() {
        let policy = PrivacyPolicy::standard("/");
        let viewer = user(1);
        let decision = policy.evaluate(&ctx(PrivacyOperation::PostEdit, &viewer, Some(1), "/posts/7/edit/"));
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_anonymous_edit_goes_to_login_with_next() {
        let policy = PrivacyPolicy::standard("/auth/login/");
        let viewer = anonymous();
        let decision = policy.evaluate(&ctx(PrivacyOperation::PostEdit, &viewer, Some(1), "/posts/7/edit/"));
        assert_eq!(
            decision,
            PrivacyDecision::Redirect("/auth/login/?next=/posts/7/edit/".to_string())
        );
    }

    #[test]
    fn test_anonymous_follow_operations_go_to_login() {
        let policy = PrivacyPolicy::standard("/");
        let viewer = anonymous();
        for operation in [
            PrivacyOperation::AddComment,
            PrivacyOperation::ProfileFollow,
            PrivacyOperation::ProfileUnfollow,
            PrivacyOperation::FollowIndex,
        ] {
            let decision = policy.evaluate(&ctx(operation, &viewer, None, "/follow/"));
            assert_eq!(decision, PrivacyDecision::Redirect("/?next=/follow/".to_string()));
        }
    }

    #[test]
    fn test_unregistered_operation_defaults_to_login() {
        let policy = PrivacyPolicy::new("/login/");
        let viewer = user(1);
        let decision = policy.evaluate(&ctx(PrivacyOperation::PostCreate, &viewer, None, "/create/"));
        assert_eq!(decision, PrivacyDecision::Redirect("/login/?next=/create/".to_string()));
    }

    #[test]
    fn test_login_redirect_encodes_query() {
        assert_eq!(login_redirect("/", "/follow/?page=2"), "/?next=/follow/%3Fpage%3D2");
        assert_eq!(login_redirect("/login/?x=1", "/create/"), "/login/?x=1&next=/create/");
        assert_eq!(login_redirect("/", "/profile/é d/"), "/?next=/profile/%C3%A9%20d/");
        assert_eq!(login_redirect("/", "/a-b_c.d~e/"), "/?next=/a-b_c.d~e/");
    }
}
