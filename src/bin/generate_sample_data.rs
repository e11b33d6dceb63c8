use tracing::info;
use tracing_subscriber::EnvFilter;

use postboard::{
    config::Config, data_seeder::seed_sample_data, infrastructure::sqlite_database::SqliteDatabase,
};

const DEFAULT_POSTS_PER_USER: usize = 12;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("postboard=info")))
        .init();

    let config = Config::from_env()?;
    let posts_per_user = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_POSTS_PER_USER);

    info!("Generating sample data in {}", config.database.url);
    let database = SqliteDatabase::connect(&config.database.url).await?;
    let summary = seed_sample_data(&database, posts_per_user).await?;

    info!(
        "Sample data ready: {} users, {} groups, {} posts",
        summary.users, summary.groups, summary.posts
    );
    info!("Run: cargo run --bin postboard, then open http://{}", config.server_address());
    Ok(())
}
