use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;
use visitlog::auth::{DeviceConsent, FileTokenStore, LogPrompt, MemoryTokenStore, TokenPolicy};
use visitlog::config::ServerSettings;
use visitlog::services::{
    build_client, DriveStorage, GoogleCalendar, LogMailer, MapsGeocoder, PostgrestRowStore,
    SheetsAppender,
};
use visitlog::{
    Config, Directory, ImageNormalizer, PipelineConfig, PipelineServices, SessionCache,
    SessionService, SubmissionPipeline, TokenEncryptor, TokenManager, TokenStore,
};

use crate::error::ApiError;

struct SessionEntry {
    cache: SessionCache,
    last_seen: Instant,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ServerSettings>,
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    pub session_service: SessionService,
    pub pipeline: Arc<SubmissionPipeline>,
    pub normalizer: ImageNormalizer,
    pub tokens: TokenManager,
    pub local_offset: FixedOffset,
}

impl AppState {
    /// Assembles state from already-built collaborators.
    pub fn new(
        settings: ServerSettings,
        session_service: SessionService,
        pipeline: SubmissionPipeline,
        normalizer: ImageNormalizer,
        tokens: TokenManager,
    ) -> Self {
        let local_offset = pipeline.config().local_offset;
        Self {
            settings: Arc::new(settings),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_service,
            pipeline: Arc::new(pipeline),
            normalizer,
            tokens,
            local_offset,
        }
    }

    /// Wires the HTTP-backed services described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let client = build_client(&config.api).map_err(|e| ApiError::Config(e.to_string()))?;

        let store: Arc<dyn TokenStore> = match &config.auth.token_store_path {
            Some(path) => {
                let mut store = FileTokenStore::new(path);
                if config.auth.encrypt_token_store {
                    let encryptor =
                        TokenEncryptor::from_env().map_err(|e| ApiError::Config(e.to_string()))?;
                    store = store.with_encryptor(encryptor);
                }
                Arc::new(store)
            }
            None => Arc::new(MemoryTokenStore::new()),
        };
        let consent = DeviceConsent::new(
            client.clone(),
            &config.api,
            &config.google,
            Arc::new(LogPrompt),
        )?;
        let tokens = TokenManager::new(
            Arc::new(consent),
            store,
            TokenPolicy::from_config(&config.auth),
        );

        let row_store = Arc::new(
            PostgrestRowStore::new(client.clone(), &config.row_store)
                .map_err(|e| ApiError::Config(e.to_string()))?,
        );
        let maps_key = match &config.google.maps_api_key {
            Some(source) => Some(source.resolve().map_err(|e| ApiError::Config(e.to_string()))?),
            None => None,
        };
        if maps_key.is_none() {
            log::warn!("No maps API key configured; addresses will not be resolved");
        }

        let services = PipelineServices {
            row_store: row_store.clone(),
            files: Arc::new(DriveStorage::new(client.clone(), &config.api, tokens.clone())),
            sheets: Arc::new(SheetsAppender::new(client.clone(), &config.api, tokens.clone())),
            geocoder: Arc::new(MapsGeocoder::new(client.clone(), &config.api.geocode, maps_key)),
            calendar: Arc::new(GoogleCalendar::new(client, &config.api, tokens.clone())),
            mailer: Arc::new(LogMailer),
        };
        let pipeline = SubmissionPipeline::new(Arc::new(PipelineConfig::from_config(config)), services);

        let directory = Directory::new(row_store, config.product_catalog.clone());
        let session_service = SessionService::new(directory, &config.company_email_domain);

        Ok(Self::new(
            config.server.clone(),
            session_service,
            pipeline,
            ImageNormalizer::from_config(&config.image),
            tokens,
        ))
    }

    fn session_idle(&self) -> Duration {
        Duration::from_secs(self.settings.session_idle_secs)
    }

    /// Stores a new session. Idle sessions are dropped first, then the least
    /// recently used ones while the map is at `max_sessions`.
    pub async fn open_session(&self, cache: SessionCache) -> Uuid {
        let now = Instant::now();
        let idle = self.session_idle();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < idle);
        while !sessions.is_empty() && sessions.len() >= self.settings.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => sessions.remove(&id),
                None => break,
            };
        }
        let dropped = before - sessions.len();
        if dropped > 0 {
            log::debug!("Dropped {} stale sessions", dropped);
        }

        let id = Uuid::new_v4();
        sessions.insert(
            id,
            SessionEntry {
                cache,
                last_seen: now,
            },
        );
        id
    }

    /// Looks up a live session and marks it used.
    pub async fn session(&self, id: Uuid) -> Result<SessionCache, ApiError> {
        let now = Instant::now();
        let idle = self.session_idle();
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(entry) if now.duration_since(entry.last_seen) < idle => {
                entry.last_seen = now;
                Ok(entry.cache.clone())
            }
            Some(_) => {
                sessions.remove(&id);
                Err(ApiError::SessionNotFound)
            }
            None => Err(ApiError::SessionNotFound),
        }
    }

    pub async fn replace_session(&self, id: Uuid, cache: SessionCache) -> Result<(), ApiError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(entry) => {
                entry.cache = cache;
                entry.last_seen = Instant::now();
                Ok(())
            }
            None => Err(ApiError::SessionNotFound),
        }
    }

    pub async fn close_session(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }
}
