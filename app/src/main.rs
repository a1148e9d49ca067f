// app/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use soulsketch_app::config::AppConfig;
use soulsketch_app::services::housekeeping;
use soulsketch_app::state::AppState;
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  soulsketch_app::init_tracing();
  tracing::info!("Starting Soulsketch server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let app_state = match AppState::build(app_config).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialize application state.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  let sweeper = housekeeping::spawn_sweeper(
    app_state.config.upload_dir.clone(),
    Duration::from_secs(app_state.config.file_max_age_hours * 60 * 60),
    housekeeping::SWEEP_INTERVAL,
  );

  let server_address = format!("{}:{}", app_state.config.server_host, app_state.config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  let server_state = app_state.clone();
  let result = HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(server_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(soulsketch_app::web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await;

  sweeper.abort();
  app_state.store.close().await;
  tracing::info!("Server stopped.");
  result
}
