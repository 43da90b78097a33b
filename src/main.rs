//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; the workflow lives in InsertionService.

use dotenv::dotenv;
use poi_promo::adapters::agency::{AgencyHttpAdapter, MockNotifier};
use poi_promo::adapters::persistence::{SqliteRepo, catalog_seed};
use poi_promo::adapters::ui::tui::TuiInputPort;
use poi_promo::domain::ImageValidator;
use poi_promo::ports::{
    ContentRepository, InputPort, InsertionPort, NotificationGateway, PoiDirectory,
};
use poi_promo::shared::config::AppConfig;
use poi_promo::usecases::{ContentQueryService, InsertionService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    poi_promo::adapters::ui::init_ui();

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let data_path = PathBuf::from(cfg.data_dir_or_default());
    let data_dir_abs = data_path
        .canonicalize()
        .unwrap_or_else(|_| data_path.clone());
    info!(path = %data_dir_abs.display(), "data directory");

    // --- Store: one SQLite file serves as directory and content repository ---
    let store = Arc::new(
        SqliteRepo::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );

    if let Some(catalog) = cfg.catalog_path.as_deref() {
        let points =
            catalog_seed::load_seed_file(catalog, cfg.default_max_content_count_or_default())
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
        for poi in &points {
            store
                .upsert_point(poi)
                .await
                .map_err(|e| anyhow::anyhow!("seed {}: {}", poi.id, e))?;
        }
        info!(path = catalog, count = points.len(), "catalog seeded");
    } else {
        warn!("POI_PROMO_CATALOG_PATH not set; using points already in the database");
    }

    let directory: Arc<dyn PoiDirectory> = Arc::clone(&store) as Arc<dyn PoiDirectory>;
    let repo: Arc<dyn ContentRepository> = Arc::clone(&store) as Arc<dyn ContentRepository>;

    // --- Agency notifier ---
    let notifier: Arc<dyn NotificationGateway> = if cfg.is_agency_configured() {
        let url = cfg.agency_url.clone().unwrap_or_default();
        info!(url = %url, "agency notifications enabled");
        Arc::new(
            AgencyHttpAdapter::new(url, cfg.agency_token.clone(), cfg.agency_timeout())
                .map_err(|e| anyhow::anyhow!("{}", e))?,
        )
    } else {
        warn!("POI_PROMO_AGENCY_URL not set, using mock notifier");
        Arc::new(MockNotifier::new())
    };

    // --- Services ---
    let rules = cfg.image_rules();
    info!(
        allowed = ?rules.allowed,
        max_bytes = rules.max_bytes,
        min_width = rules.min_width,
        min_height = rules.min_height,
        "image rules"
    );
    let insertion: Arc<dyn InsertionPort> = Arc::new(
        InsertionService::new(
            ImageValidator::new(rules),
            Arc::clone(&directory),
            Arc::clone(&repo),
            notifier,
        )
        .with_proposal_ttl(cfg.proposal_ttl()),
    );
    let queries = Arc::new(ContentQueryService::new(directory, repo));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(insertion, queries));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
