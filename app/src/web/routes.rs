// app/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::order_handlers;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("/{id}", web::get().to(order_handlers::get_order_handler))
          .route("/{id}/intake", web::post().to(order_handlers::intake_handler))
          .route("/{id}/generate", web::post().to(order_handlers::generate_handler)),
      ),
  );
}
