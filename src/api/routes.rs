// API routes configuration
// Author: Gabriel Demetrios Lafis

use actix_web::{web, HttpResponse, Responder};

use super::handlers;

/// Configure API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Upstream proxy
            .route("/proxy", web::get().to(handlers::proxy_get))
            .route("/proxy", web::post().to(handlers::proxy_post))
            .service(
                web::scope("/v1")
                    // Health check
                    .route("/health", web::get().to(health_check))

                    // API catalog
                    .service(
                        web::scope("/apis")
                            .route("", web::get().to(handlers::list_apis))
                            .route("/{id}", web::get().to(handlers::get_api))
                            .route("/{id}/rows", web::get().to(handlers::get_api_rows))
                    )

                    // Explorer
                    .service(
                        web::scope("/explorer")
                            .route("/join", web::post().to(handlers::explorer_join))
                            .route("/chart-config", web::post().to(handlers::chart_config))
                    )

                    // Saved visualizations
                    .service(
                        web::scope("/visualizations")
                            .route("", web::get().to(handlers::list_visualizations))
                            .route("", web::post().to(handlers::save_visualization))
                            .route("/{id}", web::get().to(handlers::get_visualization))
                            .route("/{id}", web::delete().to(handlers::delete_visualization))
                    )

                    // Dashboard datasets
                    .route("/datasets/{id}", web::get().to(handlers::get_dataset))
            )
    );
}

/// Health check handler
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
