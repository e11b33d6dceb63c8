use tracing::{debug, instrument};

use super::{authorize, post_detail_url, Outcome};
use crate::{
    app_state::AppState,
    ent_framework::PrivacyOperation,
    entities::{NewComment, PostId},
    error::AppResult,
    forms::{CommentForm, CommentFormData},
    infrastructure::viewer::ViewerContext,
};

/// Adds a comment and always returns to the post, whether or not it saved.
#[instrument(skip(state, viewer, data), fields(request_id = %viewer.request_id))]
pub async fn add_comment(
    state: &AppState,
    viewer: &ViewerContext,
    request_path: &str,
    post_id: PostId,
    data: CommentFormData,
) -> AppResult<Outcome> {
    let author = match authorize(state, viewer, PrivacyOperation::AddComment, None, Some(post_id), request_path) {
        Ok(user) => user,
        Err(denied) => return Ok(denied),
    };
    let Some(post) = state.db.get_post(post_id).await? else {
        return Ok(Outcome::NotFound);
    };

    let form = CommentForm::bind(data);
    match form.cleaned_text() {
        Some(text) => {
            state
                .db
                .create_comment(NewComment {
                    post_id: post.id,
                    author_id: author.id,
                    text: text.to_string(),
                })
                .await?;
        }
        None => debug!("Discarded invalid comment on post {}: {:?}", post.id, form.errors),
    }

    Ok(Outcome::redirect(post_detail_url(post.id)))
}
