use tracing::{debug, info, instrument, warn};

use super::{
    authorize, post_detail_url, profile_url, Outcome, PostSubmission, CREATE_POST_TEMPLATE,
    CREATE_POST_TITLE, EDIT_POST_TITLE, GROUP_LIST_TEMPLATE, INDEX_TEMPLATE,
    POST_DETAIL_TEMPLATE, PROFILE_TEMPLATE,
};
use crate::{
    app_state::AppState,
    ent_framework::PrivacyOperation,
    entities::{truncate_chars, NewPost, PostChanges, PostId},
    error::{AppError, AppResult},
    forms::{CommentForm, PostForm, UploadedFile},
    infrastructure::{database::PostFilter, presenter::Context, viewer::ViewerContext},
};

/// Directory under the media root that post images go to.
pub const POST_IMAGE_DIR: &str = "posts";

const DETAIL_TITLE_CHARS: usize = 30;

/// Home feed over every post.
#[instrument(skip(state))]
pub async fn index(state: &AppState, page: Option<&str>) -> AppResult<Outcome> {
    let page_obj = state.feeds.page(PostFilter::All, page).await?;
    let context = Context::new().with("page_obj", page_obj)?;
    Ok(Outcome::rendered(INDEX_TEMPLATE, context))
}

#[instrument(skip(state))]
pub async fn group_posts(state: &AppState, slug: &str, page: Option<&str>) -> AppResult<Outcome> {
    let Some(group) = state.db.get_group_by_slug(slug).await? else {
        return Ok(Outcome::NotFound);
    };
    let page_obj = state.feeds.page(PostFilter::Group(group.id), page).await?;
    let context = Context::new()
        .with("page_obj", page_obj)?
        .with("group", group)?;
    Ok(Outcome::rendered(GROUP_LIST_TEMPLATE, context))
}

#[instrument(skip(state, viewer), fields(request_id = %viewer.request_id))]
pub async fn profile(
    state: &AppState,
    viewer: &ViewerContext,
    username: &str,
    page: Option<&str>,
) -> AppResult<Outcome> {
    let Some(author) = state.db.get_user_by_username(username).await? else {
        return Ok(Outcome::NotFound);
    };
    let page_obj = state.feeds.page(PostFilter::Author(author.id), page).await?;

    let following = match viewer.user_id() {
        Some(user_id) => Some(state.db.is_following(user_id, author.id).await?),
        None => None,
    };
    let myself = viewer.is_user(author.id);

    let context = Context::new()
        .with("page_obj", page_obj)?
        .with("author", &author)?
        .with("following", following)?
        .with("myself", myself)?;
    Ok(Outcome::rendered(PROFILE_TEMPLATE, context))
}

#[instrument(skip(state))]
pub async fn post_detail(state: &AppState, post_id: PostId) -> AppResult<Outcome> {
    let Some(post) = state.db.get_post(post_id).await? else {
        return Ok(Outcome::NotFound);
    };
    let comments = state.db.list_comments(post_id).await?;

    let context = Context::new()
        .with("title", truncate_chars(&post.text, DETAIL_TITLE_CHARS))?
        .with("post", post)?
        .with("form", CommentForm::unbound())?
        .with("comments_count", comments.len())?
        .with("comments", comments)?;
    Ok(Outcome::rendered(POST_DETAIL_TEMPLATE, context))
}

/// GET shows an empty form, POST creates the post as the caller.
#[instrument(skip(state, viewer, submission), fields(request_id = %viewer.request_id))]
pub async fn post_create(
    state: &AppState,
    viewer: &ViewerContext,
    request_path: &str,
    submission: Option<PostSubmission>,
) -> AppResult<Outcome> {
    let author = match authorize(state, viewer, PrivacyOperation::PostCreate, None, None, request_path) {
        Ok(user) => user,
        Err(denied) => return Ok(denied),
    };

    let groups = state.db.list_groups().await?;
    let form = match submission.filter(|s| !s.is_empty()) {
        None => PostForm::unbound(&groups),
        Some(submission) => PostForm::bind(submission.data, submission.image, &groups),
    };

    if let Some(cleaned) = form.cleaned().cloned() {
        let image = store_image(state, cleaned.image.as_ref()).await?;
        let created = state
            .db
            .create_post(NewPost {
                text: cleaned.text,
                author_id: author.id,
                group_id: cleaned.group_id,
                image: image.clone(),
            })
            .await;
        let post = match created {
            Ok(post) => post,
            Err(e) => return Err(discard_image(state, image.as_deref(), e).await),
        };
        info!("User {} created post {}", author.username, post.id);
        return Ok(Outcome::redirect(profile_url(&author.username)));
    }

    if form.is_bound {
        debug!("Rejected post form: {:?}", form.errors);
    }
    let context = Context::new()
        .with("form", form)?
        .with("title", CREATE_POST_TITLE)?;
    Ok(Outcome::rendered(CREATE_POST_TEMPLATE, context))
}

/// Author-only edit. Anyone else is sent back to the post without an error.
#[instrument(skip(state, viewer, submission), fields(request_id = %viewer.request_id))]
pub async fn post_edit(
    state: &AppState,
    viewer: &ViewerContext,
    request_path: &str,
    post_id: PostId,
    submission: Option<PostSubmission>,
) -> AppResult<Outcome> {
    let Some(post) = state.db.get_post(post_id).await? else {
        return Ok(Outcome::NotFound);
    };
    if let Err(denied) = authorize(
        state,
        viewer,
        PrivacyOperation::PostEdit,
        Some(post.author_id),
        Some(post.id),
        request_path,
    ) {
        return Ok(denied);
    }

    let groups = state.db.list_groups().await?;
    let form = match submission.filter(|s| !s.is_empty()) {
        None => PostForm::for_instance(&post, &groups),
        Some(submission) => PostForm::bind_instance(&post, submission.data, submission.image, &groups),
    };

    if let Some(cleaned) = form.cleaned().cloned() {
        let stored = store_image(state, cleaned.image.as_ref()).await?;
        let changes = PostChanges {
            text: cleaned.text,
            group_id: cleaned.group_id,
            image: stored.clone().or_else(|| post.image.clone()),
        };
        if let Err(e) = state.db.update_post(post.id, changes).await {
            return Err(discard_image(state, stored.as_deref(), e).await);
        }
        info!("Post {} edited by its author", post.id);
        return Ok(Outcome::redirect(post_detail_url(post.id)));
    }

    if form.is_bound {
        debug!("Rejected edit of post {}: {:?}", post.id, form.errors);
    }
    let context = Context::new()
        .with("form", form)?
        .with("is_edit", true)?
        .with("title", EDIT_POST_TITLE)?;
    Ok(Outcome::rendered(CREATE_POST_TEMPLATE, context))
}

/// Removes an upload whose post was never written, then hands back the store error.
async fn discard_image(state: &AppState, stored: Option<&str>, error: AppError) -> AppError {
    if let Some(path) = stored {
        if let Err(e) = state.media.remove(path).await {
            warn!("Could not remove orphaned upload {}: {}", path, e);
        }
    }
    error
}

async fn store_image(state: &AppState, image: Option<&UploadedFile>) -> AppResult<Option<String>> {
    match image {
        Some(file) => Ok(Some(
            state.media.save(POST_IMAGE_DIR, &file.file_name, &file.data).await?,
        )),
        None => Ok(None),
    }
}
