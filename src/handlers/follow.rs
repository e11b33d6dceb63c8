use tracing::{debug, info, instrument};

use super::{authorize, profile_url, Outcome, FOLLOW_TEMPLATE};
use crate::{
    app_state::AppState,
    ent_framework::PrivacyOperation,
    error::AppResult,
    infrastructure::{presenter::Context, viewer::ViewerContext},
};

/// Feed of posts by every author the caller follows.
#[instrument(skip(state, viewer), fields(request_id = %viewer.request_id))]
pub async fn follow_index(
    state: &AppState,
    viewer: &ViewerContext,
    request_path: &str,
    page: Option<&str>,
) -> AppResult<Outcome> {
    let user = match authorize(state, viewer, PrivacyOperation::FollowIndex, None, None, request_path) {
        Ok(user) => user,
        Err(denied) => return Ok(denied),
    };

    let page_obj = state.feeds.follow_feed(user.id, page).await?;
    let context = Context::new().with("page_obj", page_obj)?;
    Ok(Outcome::rendered(FOLLOW_TEMPLATE, context))
}

/// Idempotent follow; following yourself is silently skipped.
#[instrument(skip(state, viewer), fields(request_id = %viewer.request_id))]
pub async fn profile_follow(
    state: &AppState,
    viewer: &ViewerContext,
    request_path: &str,
    username: &str,
) -> AppResult<Outcome> {
    let user = match authorize(state, viewer, PrivacyOperation::ProfileFollow, None, None, request_path) {
        Ok(user) => user,
        Err(denied) => return Ok(denied),
    };
    let Some(author) = state.db.get_user_by_username(username).await? else {
        return Ok(Outcome::NotFound);
    };

    if user.id == author.id {
        debug!("Skipped self-follow of {}", author.username);
    } else if let Some(edge) = state.db.follow(user.id, author.id).await? {
        info!("User {} now follows {} (edge {})", user.username, author.username, edge.id);
    }
    Ok(Outcome::redirect(profile_url(&author.username)))
}

/// Removes the follow edge if there is one.
#[instrument(skip(state, viewer), fields(request_id = %viewer.request_id))]
pub async fn profile_unfollow(
    state: &AppState,
    viewer: &ViewerContext,
    request_path: &str,
    username: &str,
) -> AppResult<Outcome> {
    let user = match authorize(state, viewer, PrivacyOperation::ProfileUnfollow, None, None, request_path) {
        Ok(user) => user,
        Err(denied) => return Ok(denied),
    };
    let Some(author) = state.db.get_user_by_username(username).await? else {
        return Ok(Outcome::NotFound);
    };

    let removed = state.db.unfollow(user.id, author.id).await?;
    debug!("Removed {} follow edge(s) {} -> {}", removed, user.id, author.id);
    Ok(Outcome::redirect(profile_url(&author.username)))
}
