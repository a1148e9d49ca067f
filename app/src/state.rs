// app/src/state.rs
use crate::config::AppConfig;
use crate::db::OrderStore;
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines;
use crate::services::Services;
use sketchflow::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: OrderStore,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub services: Arc<Services>,
}

impl AppState {
  /// Opens the store, creates artifact directories, builds services and registers every
  /// pipeline.
  pub async fn build(config: AppConfig) -> AppResult<Self> {
    crate::services::storage::ensure_directories(&config).await?;
    let store = OrderStore::open(&config.database_url).await?;
    let services = Services::from_config(&config)?;

    let flows = Arc::new(FlowRegistry::<AppError>::new());
    pipelines::register_all_pipelines(&flows);

    Ok(Self {
      store,
      flows,
      config: Arc::new(config),
      services: Arc::new(services),
    })
  }
}
