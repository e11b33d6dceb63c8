// Postboard server

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use postboard::{app_state::AppState, blog_interface::create_blog_router, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("postboard=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(config.clone()).await?;
    let app = create_blog_router(app_state);

    let addr = config.server_address();
    info!("Postboard starting on http://{}", addr);
    info!("Serving media from {}", config.media.root.display());

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
