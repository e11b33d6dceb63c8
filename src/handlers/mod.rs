// Request handlers - each returns an Outcome for the HTTP layer to turn into a response

pub mod comments;
pub mod follow;
pub mod posts;

use crate::{
    app_state::AppState,
    ent_framework::{login_redirect, PrivacyContext, PrivacyDecision, PrivacyOperation},
    entities::{EntUser, PostId, UserId},
    forms::{PostFormData, UploadedFile},
    infrastructure::{presenter::Context, viewer::ViewerContext},
};

pub const INDEX_TEMPLATE: &str = "posts/index.html";
pub const GROUP_LIST_TEMPLATE: &str = "posts/group_list.html";
pub const PROFILE_TEMPLATE: &str = "posts/profile.html";
pub const POST_DETAIL_TEMPLATE: &str = "posts/post_detail.html";
pub const CREATE_POST_TEMPLATE: &str = "posts/create_post.html";
pub const FOLLOW_TEMPLATE: &str = "posts/follow.html";

pub const CREATE_POST_TITLE: &str = "New post";
pub const EDIT_POST_TITLE: &str = "Edit post";

/// What a handler produced, independent of HTTP.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rendered {
        template: &'static str,
        context: Context,
    },
    Redirect {
        target: String,
    },
    NotFound,
}

impl Outcome {
    pub fn rendered(template: &'static str, context: Context) -> Self {
        Outcome::Rendered { template, context }
    }

    pub fn redirect(target: impl Into<String>) -> Self {
        Outcome::Redirect {
            target: target.into(),
        }
    }

    pub fn context(&self) -> Option<&Context> {
        match self {
            Outcome::Rendered { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Outcome::Redirect { target } => Some(target),
            _ => None,
        }
    }
}

/// A submitted post form: text fields plus an optional upload.
#[derive(Debug, Clone, Default)]
pub struct PostSubmission {
    pub data: PostFormData,
    pub image: Option<UploadedFile>,
}

impl PostSubmission {
    /// Nothing was submitted at all; treated like a GET.
    pub fn is_empty(&self) -> bool {
        self.data.text.is_none() && self.data.group.is_none() && self.image.is_none()
    }
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn post_detail_url(post_id: PostId) -> String {
    format!("/posts/{}/", post_id)
}

/// Runs the privacy policy and yields the acting user, or the redirect for a
/// denied caller. Mutations always need a user, so an allowed anonymous
/// caller is still sent to login.
fn authorize<'a>(
    state: &AppState,
    viewer: &'a ViewerContext,
    operation: PrivacyOperation,
    owner_id: Option<UserId>,
    post_id: Option<PostId>,
    request_path: &str,
) -> Result<&'a EntUser, Outcome> {
    let ctx = PrivacyContext {
        operation,
        viewer,
        owner_id,
        post_id,
        request_path,
    };
    match (state.privacy.evaluate(&ctx), viewer.user.as_ref()) {
        (PrivacyDecision::Allow, Some(user)) => Ok(user),
        (PrivacyDecision::Allow, None) => Err(Outcome::redirect(login_redirect(
            state.privacy.login_url(),
            request_path,
        ))),
        (PrivacyDecision::Redirect(target), _) => Err(Outcome::redirect(target)),
    }
}
