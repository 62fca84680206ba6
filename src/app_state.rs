use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::{
        auth::AuthService,
        database::ContentStore,
        middleware::{HasAuth, HasServiceKey},
        sqlite_database::SqliteDatabase,
        storage::{LocalObjectStore, ObjectStore},
    },
    services::{
        AccountEraser, ContentService, DetailFetcher, DetailPolicy, DraftService, GalleryService,
        PreviewRegistry, ProfileAggregator, SocialService, UploadService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ContentStore>,
    pub auth: AuthService,
    pub previews: PreviewRegistry,
    pub uploads: UploadService,
    pub eraser: AccountEraser,
    pub profiles: ProfileAggregator,
    pub gallery: GalleryService,
    pub details: DetailFetcher,
    pub content: ContentService,
    pub social: SocialService,
    pub drafts: DraftService,
    pub storage_root: PathBuf,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database
        let database = SqliteDatabase::connect(&config.database.url, config.database.max_connections).await?;
        database.health_check().await?;

        let storage = LocalObjectStore::new(&config.storage.root, &config.storage.public_base_url);
        tokio::fs::create_dir_all(storage.root()).await?;

        Ok(Self::from_parts(config, Arc::new(database), Arc::new(storage)))
    }

    /// Wire every service over the given backends.
    pub fn from_parts(config: Config, store: Arc<dyn ContentStore>, storage: Arc<LocalObjectStore>) -> Self {
        let auth = AuthService::new(store.clone(), config.session_ttl());
        let previews = PreviewRegistry::new();
        let storage_root = storage.root().to_path_buf();
        let object_store: Arc<dyn ObjectStore> = storage;
        let policy = DetailPolicy {
            timeout: config.detail_timeout(),
            max_attempts: config.timing.detail_max_attempts,
        };

        let drafts = DraftService::new(store.clone(), config.autosave_idle());

        Self {
            uploads: UploadService::new(object_store, previews.clone()),
            eraser: AccountEraser::new(
                store.clone(),
                auth.clone(),
                previews.clone(),
                drafts.clone(),
                config.timing.erase_redirect_delay_ms,
            ),
            profiles: ProfileAggregator::new(store.clone()),
            gallery: GalleryService::new(store.clone()),
            details: DetailFetcher::new(store.clone(), policy),
            content: ContentService::new(store.clone()),
            social: SocialService::new(store.clone()),
            drafts,
            config: Arc::new(config),
            store,
            auth,
            previews,
            storage_root,
        }
    }
}

impl HasAuth for AppState {
    fn auth(&self) -> &AuthService {
        &self.auth
    }
}

impl HasServiceKey for AppState {
    fn service_role_key(&self) -> Option<&str> {
        self.config.auth.service_role_key.as_deref()
    }
}
