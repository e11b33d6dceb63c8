// Blog HTTP interface - maps routes onto handlers and handler outcomes onto responses

use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartError, rejection::FormRejection, FromRequest, Multipart, OriginalUri,
        Path, Query, Request, State,
    },
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::convert::Infallible;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::debug;

use crate::{
    app_state::AppState,
    entities::PostId,
    error::{AppResult, NOT_FOUND_TEMPLATE},
    forms::{CommentFormData, PostFormData, UploadedFile},
    handlers::{self, Outcome, PostSubmission},
    infrastructure::{
        cache::index_page_key, middleware::viewer_context_middleware, presenter::Context, Vc,
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub fn create_blog_router(state: AppState) -> Router {
    let media = ServeDir::new(state.config.media.root.clone());

    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/profile/{username}/follow/", get(profile_follow))
        .route("/profile/{username}/unfollow/", get(profile_unfollow))
        .route("/posts/{post_id}/", get(post_detail))
        .route("/posts/{post_id}/edit/", get(post_edit_form).post(post_edit_submit))
        .route("/posts/{post_id}/comment/", post(add_comment))
        .route("/create/", get(post_create_form).post(post_create_submit))
        .route("/follow/", get(follow_index))
        .nest_service("/media", media)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware::<AppState>,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turns a handler outcome into an HTTP response.
pub fn respond(state: &AppState, outcome: Outcome) -> AppResult<Response> {
    match outcome {
        Outcome::Rendered { template, context } => {
            let body = state.presenter.render(template, &context)?;
            Ok(rendered_response(state, StatusCode::OK, body))
        }
        Outcome::Redirect { target } => {
            Ok((StatusCode::FOUND, [(header::LOCATION, target)]).into_response())
        }
        Outcome::NotFound => {
            let context = Context::new().with("status", StatusCode::NOT_FOUND.as_u16())?;
            let body = state.presenter.render(NOT_FOUND_TEMPLATE, &context)?;
            Ok(rendered_response(state, StatusCode::NOT_FOUND, body))
        }
    }
}

fn rendered_response(state: &AppState, status: StatusCode, body: Bytes) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, state.presenter.content_type())],
        body,
    )
        .into_response()
}

fn path_and_query(uri: &OriginalUri) -> &str {
    uri.0.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

/// Non-numeric ids cannot match any post.
fn parse_post_id(raw: &str) -> Option<PostId> {
    raw.parse().ok()
}

// The home feed is served from the page cache while its entry is fresh.
async fn index(
    State(state): State<AppState>,
    uri: OriginalUri,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let key = index_page_key(path_and_query(&uri));
    if let Some(body) = state.page_cache.get(&key) {
        return Ok(rendered_response(&state, StatusCode::OK, body));
    }

    match handlers::posts::index(&state, query.page.as_deref()).await? {
        Outcome::Rendered { template, context } => {
            let body = state.presenter.render(template, &context)?;
            state.page_cache.insert(key, body.clone());
            Ok(rendered_response(&state, StatusCode::OK, body))
        }
        other => respond(&state, other),
    }
}

async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let outcome = handlers::posts::group_posts(&state, &slug, query.page.as_deref()).await?;
    respond(&state, outcome)
}

async fn profile(
    State(state): State<AppState>,
    vc: Vc,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let outcome = handlers::posts::profile(&state, &vc, &username, query.page.as_deref()).await?;
    respond(&state, outcome)
}

async fn post_detail(State(state): State<AppState>, Path(post_id): Path<String>) -> AppResult<Response> {
    let outcome = match parse_post_id(&post_id) {
        Some(post_id) => handlers::posts::post_detail(&state, post_id).await?,
        None => Outcome::NotFound,
    };
    respond(&state, outcome)
}

async fn post_create_form(State(state): State<AppState>, vc: Vc, uri: OriginalUri) -> AppResult<Response> {
    let outcome = handlers::posts::post_create(&state, &vc, path_and_query(&uri), None).await?;
    respond(&state, outcome)
}

async fn post_create_submit(
    State(state): State<AppState>,
    vc: Vc,
    uri: OriginalUri,
    PostSubmissionInput(submission): PostSubmissionInput,
) -> AppResult<Response> {
    let outcome =
        handlers::posts::post_create(&state, &vc, path_and_query(&uri), Some(submission)).await?;
    respond(&state, outcome)
}

async fn post_edit_form(
    State(state): State<AppState>,
    vc: Vc,
    uri: OriginalUri,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let outcome = match parse_post_id(&post_id) {
        Some(post_id) => {
            handlers::posts::post_edit(&state, &vc, path_and_query(&uri), post_id, None).await?
        }
        None => Outcome::NotFound,
    };
    respond(&state, outcome)
}

async fn post_edit_submit(
    State(state): State<AppState>,
    vc: Vc,
    uri: OriginalUri,
    Path(post_id): Path<String>,
    PostSubmissionInput(submission): PostSubmissionInput,
) -> AppResult<Response> {
    let outcome = match parse_post_id(&post_id) {
        Some(post_id) => {
            handlers::posts::post_edit(&state, &vc, path_and_query(&uri), post_id, Some(submission))
                .await?
        }
        None => Outcome::NotFound,
    };
    respond(&state, outcome)
}

async fn add_comment(
    State(state): State<AppState>,
    vc: Vc,
    uri: OriginalUri,
    Path(post_id): Path<String>,
    form: Result<Form<CommentFormData>, FormRejection>,
) -> AppResult<Response> {
    let data = match form {
        Ok(Form(data)) => data,
        Err(rejection) => {
            debug!("Unreadable comment form: {}", rejection);
            CommentFormData::default()
        }
    };
    let outcome = match parse_post_id(&post_id) {
        Some(post_id) => {
            handlers::comments::add_comment(&state, &vc, path_and_query(&uri), post_id, data).await?
        }
        None => Outcome::NotFound,
    };
    respond(&state, outcome)
}

async fn follow_index(
    State(state): State<AppState>,
    vc: Vc,
    uri: OriginalUri,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let outcome =
        handlers::follow::follow_index(&state, &vc, path_and_query(&uri), query.page.as_deref()).await?;
    respond(&state, outcome)
}

async fn profile_follow(
    State(state): State<AppState>,
    vc: Vc,
    uri: OriginalUri,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let outcome = handlers::follow::profile_follow(&state, &vc, path_and_query(&uri), &username).await?;
    respond(&state, outcome)
}

async fn profile_unfollow(
    State(state): State<AppState>,
    vc: Vc,
    uri: OriginalUri,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let outcome =
        handlers::follow::profile_unfollow(&state, &vc, path_and_query(&uri), &username).await?;
    respond(&state, outcome)
}

async fn not_found(State(state): State<AppState>) -> AppResult<Response> {
    respond(&state, Outcome::NotFound)
}

/// Post form body, urlencoded or multipart. Unreadable or other bodies bind as
/// empty so the privacy gate still decides the response.
pub struct PostSubmissionInput(pub PostSubmission);

impl<S> FromRequest<S> for PostSubmissionInput
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let submission = if content_type.starts_with("multipart/form-data") {
            match Multipart::from_request(req, state).await {
                Ok(multipart) => read_multipart(multipart).await.unwrap_or_else(|e| {
                    debug!("Unreadable multipart post form: {}", e);
                    PostSubmission::default()
                }),
                Err(rejection) => {
                    debug!("Rejected multipart post form: {}", rejection);
                    PostSubmission::default()
                }
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            match Form::<PostFormData>::from_request(req, state).await {
                Ok(Form(data)) => PostSubmission { data, image: None },
                Err(rejection) => {
                    debug!("Unreadable post form: {}", rejection);
                    PostSubmission::default()
                }
            }
        } else {
            PostSubmission::default()
        };
        Ok(Self(submission))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<PostSubmission, MultipartError> {
    let mut submission = PostSubmission::default();
    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or_default() {
            "text" => submission.data.text = Some(field.text().await?),
            "group" => submission.data.group = Some(field.text().await?),
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?.to_vec();
                submission.image = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }
    Ok(submission)
}
