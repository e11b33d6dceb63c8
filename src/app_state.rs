use std::sync::Arc;

use crate::{
    config::Config,
    ent_framework::PrivacyPolicy,
    error::AppResult,
    infrastructure::{
        cache::FragmentCache,
        database::DatabaseInterface,
        media_storage::MediaStorage,
        middleware::{HasIdentityProvider, IdentityProvider, TrustedHeaderIdentity},
        presenter::{JsonPresenter, Presenter},
        sqlite_database::SqliteDatabase,
    },
    services::FeedService,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseInterface>,
    pub feeds: FeedService,
    pub identity: Arc<dyn IdentityProvider>,
    pub presenter: Arc<dyn Presenter>,
    pub page_cache: Arc<FragmentCache>,
    pub privacy: Arc<PrivacyPolicy>,
    pub media: MediaStorage,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let database = SqliteDatabase::connect(&config.database.url).await?;
        Self::with_database(config, Arc::new(database))
    }

    /// Wires every port around an already-initialised store.
    pub fn with_database(config: Config, db: Arc<dyn DatabaseInterface>) -> AppResult<Self> {
        let identity = TrustedHeaderIdentity::new(&config.auth.identity_header, db.clone())?;

        Ok(Self {
            feeds: FeedService::new(db.clone()),
            identity: Arc::new(identity),
            presenter: Arc::new(JsonPresenter),
            page_cache: Arc::new(FragmentCache::new(config.cache.capacity, config.page_ttl())),
            privacy: Arc::new(PrivacyPolicy::standard(config.auth.login_url.clone())),
            media: MediaStorage::new(config.media.root.clone()),
            db,
            config,
        })
    }
}

impl HasIdentityProvider for AppState {
    fn identity_provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }
}
