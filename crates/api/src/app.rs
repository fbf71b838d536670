use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::ports::{
    Clock, FormStore, GroupDirectory, ReminderStore, SystemClock, UserDirectory,
};
use domain::services::{
    AdmissionEngine, GroupPropagation, LoggingNotifier, ReminderNotifier, ReminderService,
    SettingsGate,
};
use persistence::repositories::{
    FormGroupRepository, FormRepository, ReminderRepository, UserRepository,
};
use persistence::{MemoryFormStore, MemoryGroupDirectory, MemoryReminderStore, MemoryUserDirectory};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, StorageBackend};
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{form_groups, forms, health, memberships, public_forms, reminders};

/// Outbound adapters the services are built on.
#[derive(Clone)]
pub struct Ports {
    pub forms: Arc<dyn FormStore>,
    pub groups: Arc<dyn GroupDirectory>,
    pub users: Arc<dyn UserDirectory>,
    pub reminders: Arc<dyn ReminderStore>,
    /// Present for the postgres backend; feeds pool gauges on readiness.
    pub pool: Option<PgPool>,
}

impl Ports {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            forms: Arc::new(FormRepository::new(pool.clone())),
            groups: Arc::new(FormGroupRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            reminders: Arc::new(ReminderRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Empty process-local stores.
    pub fn memory() -> Self {
        Self {
            forms: Arc::new(MemoryFormStore::new()),
            groups: Arc::new(MemoryGroupDirectory::new()),
            users: Arc::new(MemoryUserDirectory::new()),
            reminders: Arc::new(MemoryReminderStore::new()),
            pool: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub forms: Arc<dyn FormStore>,
    pub pool: Option<PgPool>,
    pub engine: Arc<AdmissionEngine>,
    pub gate: Arc<SettingsGate>,
    pub propagation: Arc<GroupPropagation>,
    pub reminders: Arc<ReminderService>,
}

impl AppState {
    pub fn new(config: Config, ports: Ports) -> Result<Self, JwtError> {
        let jwt = JwtConfig::with_leeway(
            &config.jwt.private_key,
            &config.jwt.public_key,
            config.jwt.access_token_expiry_secs,
            config.jwt.leeway_secs,
        )?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let notifier: Arc<dyn ReminderNotifier> = Arc::new(LoggingNotifier::new());

        Ok(Self {
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            engine: Arc::new(AdmissionEngine::new(
                ports.forms.clone(),
                ports.users.clone(),
                clock.clone(),
            )),
            gate: Arc::new(SettingsGate::new(ports.forms.clone(), clock.clone())),
            propagation: Arc::new(GroupPropagation::new(
                ports.forms.clone(),
                ports.groups.clone(),
            )),
            reminders: Arc::new(ReminderService::new(
                ports.forms.clone(),
                ports.users,
                ports.reminders,
                notifier,
                clock,
            )),
            forms: ports.forms,
            pool: ports.pool,
        })
    }

    pub fn backend(&self) -> StorageBackend {
        self.config.storage.backend
    }
}

pub fn create_app(config: Config, ports: Ports) -> Result<Router, JwtError> {
    let state = AppState::new(config, ports)?;
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    // Empty origin list allows any origin (development)
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Creator routes; auth is enforced by the UserAuth extractor
    let form_routes = Router::new()
        .route(
            "/api/v1/forms",
            get(forms::list_forms).post(forms::create_form),
        )
        .route("/api/v1/forms/:form_id", get(forms::get_form))
        .route("/api/v1/forms/:form_id/metadata", put(forms::update_metadata))
        .route("/api/v1/forms/:form_id/settings", put(forms::update_settings))
        .route("/api/v1/forms/:form_id/status", post(forms::toggle_status))
        .route(
            "/api/v1/forms/:form_id/groups/sync",
            post(form_groups::sync_rosters),
        )
        .route(
            "/api/v1/forms/:form_id/groups/:group_id",
            put(form_groups::attach_group).delete(form_groups::detach_group),
        )
        .route(
            "/api/v1/groups/:group_id/membership-events",
            post(memberships::membership_event),
        );

    let reminder_routes = Router::new()
        .route(
            "/api/v1/reminders",
            get(reminders::list_reminders).post(reminders::send_reminder),
        )
        .route(
            "/api/v1/reminders/:reminder_id",
            axum::routing::delete(reminders::delete_reminder),
        )
        .route("/api/v1/reminders/:reminder_id/seen", put(reminders::mark_seen))
        .route(
            "/api/v1/reminders/:reminder_id/unseen",
            put(reminders::mark_unseen),
        );

    // Responder routes; anonymous callers allowed
    let public_form_routes = Router::new()
        .route("/api/v1/f/:url_id", get(public_forms::view_form))
        .route(
            "/api/v1/f/:url_id/responses",
            post(public_forms::submit_response),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(public_form_routes)
        .merge(form_routes)
        .merge(reminder_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
