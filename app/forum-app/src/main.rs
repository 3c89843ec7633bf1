use std::sync::Arc;

use shaheed_api::{
    config::AppConfig,
    cors_layer, create_router, db,
    moderation::{ContentModerator, GeminiModerator},
    services::QuestionService,
    ForumServices,
};
use shaheed_auth::{AuthPlugin, Plugin};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::create_pool(&config).await?;
    info!("Database connected");

    // Auth owns the users table, so it migrates first
    let auth_plugin = AuthPlugin::new();
    auth_plugin.activate(pool.clone()).await?;
    let auth = auth_plugin
        .auth_service()
        .await
        .ok_or_else(|| anyhow::anyhow!("Authentication service unavailable after activation"))?;

    db::run_migrations(&pool).await?;

    let moderator: Option<Arc<dyn ContentModerator>> = match &config.gemini_api_key {
        Some(key) => {
            info!(model = %config.gemini_model, "Content moderation enabled");
            Some(Arc::new(GeminiModerator::new(&config.gemini_model, key)))
        }
        None => {
            warn!("GEMINI_API_KEY not set, content moderation disabled");
            None
        }
    };

    let services = Arc::new(ForumServices {
        env: config.env.clone(),
        questions: QuestionService::new(pool, moderator),
        auth,
    });

    let app = create_router(services)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer());

    let addr = config.bind_addr();
    info!(env = %config.env, api_url = %config.api_url, "Shaheed API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
