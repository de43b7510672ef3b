mod error;
mod extract;
mod handlers;

pub use error::{ApiError, ApiResult, Envelope};

use axum::{
    http::HeaderValue,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::db::Database;
use crate::events::EventBus;
use crate::gateway::GatewayClient;

/// Shared handler state. Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub events: EventBus,
    pub gateway: GatewayClient,
    pub config: Config,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            events: EventBus::new(config.event_capacity),
            gateway: GatewayClient::new(&config.gateway),
            db,
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Agents
        .route(
            "/agents",
            get(handlers::agents::list_agents)
                .post(handlers::agents::create_agent)
                .patch(handlers::agents::update_agent),
        )
        // Tasks
        .route(
            "/tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/tasks/{id}",
            get(handlers::tasks::get_task)
                .patch(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        // Messages
        .route(
            "/messages",
            get(handlers::messages::list_messages).post(handlers::messages::create_message),
        )
        // Documents
        .route(
            "/documents",
            get(handlers::documents::list_documents)
                .post(handlers::documents::create_document)
                .patch(handlers::documents::update_document)
                .delete(handlers::documents::delete_document),
        )
        // Activities
        .route(
            "/activities",
            get(handlers::activities::list_activities).post(handlers::activities::create_activity),
        )
        // Notifications
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications)
                .patch(handlers::notifications::mark_delivered),
        )
        .route(
            "/notifications/process",
            get(handlers::notifications::process_notifications),
        )
        // Reports and live updates
        .route("/standup", get(handlers::standup::standup))
        .route("/events", get(handlers::events::stream))
        // Health
        .route("/health", get(handlers::health));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::dashboard::index))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let Some(origins) = &config.cors_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
