// ViewerContext Middleware - creates the request-scoped viewer context
// Authentication itself is external; this only maps its result to a user

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    entities::EntUser,
    error::{AppError, AppResult},
    infrastructure::{database::DatabaseInterface, viewer::ViewerContext},
};

/// Identity port: turns request headers into the authenticated user, if any.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap) -> AppResult<Option<EntUser>>;
}

/// Trusts a header set by an authenticating reverse proxy (REMOTE_USER style).
/// A missing header or an unknown username means anonymous.
pub struct TrustedHeaderIdentity {
    header: HeaderName,
    db: Arc<dyn DatabaseInterface>,
}

impl TrustedHeaderIdentity {
    pub fn new(header: &str, db: Arc<dyn DatabaseInterface>) -> AppResult<Self> {
        let header = HeaderName::from_bytes(header.as_bytes()).map_err(|e| {
            AppError::ConfigurationError(format!("Invalid identity header {}: {}", header, e))
        })?;
        Ok(Self { header, db })
    }
}

#[async_trait]
impl IdentityProvider for TrustedHeaderIdentity {
    async fn authenticate(&self, headers: &HeaderMap) -> AppResult<Option<EntUser>> {
        let Some(value) = headers.get(&self.header) else {
            return Ok(None);
        };
        let Ok(username) = value.to_str() else {
            warn!("Ignoring non-ASCII {} header", self.header);
            return Ok(None);
        };
        let username = username.trim();
        if username.is_empty() {
            return Ok(None);
        }

        let user = self.db.get_user_by_username(username).await?;
        if user.is_none() {
            debug!("Unknown user {} treated as anonymous", username);
        }
        Ok(user)
    }
}

/// Trait for application state that can resolve callers
pub trait HasIdentityProvider {
    fn identity_provider(&self) -> &Arc<dyn IdentityProvider>;
}

/// ViewerContext middleware that creates request-scoped viewer context
pub async fn viewer_context_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    T: HasIdentityProvider + Clone + Send + Sync + 'static,
{
    let user = app_state
        .identity_provider()
        .authenticate(request.headers())
        .await?;

    let viewer_context = create_viewer_context(user);
    request.extensions_mut().insert(viewer_context);

    Ok(next.run(request).await)
}

fn create_viewer_context(user: Option<EntUser>) -> Arc<ViewerContext> {
    let request_id = format!("req-{}", Uuid::new_v4());
    let viewer_context = match user {
        Some(user) => ViewerContext::authenticated_user(user, request_id),
        None => ViewerContext::anonymous(request_id),
    };
    Arc::new(viewer_context)
}
