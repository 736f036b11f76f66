use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;

use super::Metrics;

// ============================================================================
// Metrics Exporter
// ============================================================================
//
// GET /metrics - Prometheus text format
// GET /health  - JSON view of the table: who is eating, forks in hand,
//                meals and resets so far
//
// ============================================================================

/// What /health reports about the dinner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub philosophers_eating: i64,
    pub forks_held: i64,
    pub meals: u64,
    pub resets: u64,
}

impl TableHealth {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let forks_held = metrics.forks_held.get();
        Self {
            // Every eater holds two forks
            status: if forks_held >= 0 && metrics.philosophers_eating.get() * 2 <= forks_held {
                "serving"
            } else {
                "inconsistent"
            },
            service: "dining-philosophers",
            philosophers_eating: metrics.philosophers_eating.get(),
            forks_held,
            meals: metrics.total_meals(),
            resets: metrics.counter_resets_total.get(),
        }
    }
}

/// Encode every registered metric in the Prometheus text format
pub fn render_metrics(metrics: &Metrics) -> Result<Vec<u8>, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics.registry().gather(), &mut buffer)?;
    Ok(buffer)
}

/// Start the metrics HTTP server
/// This should be called in a separate thread/runtime to avoid conflicts
pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> std::io::Result<()> {
    tracing::info!("📊 Starting metrics server on http://0.0.0.0:{}/metrics", port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(metrics.clone()))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler))
    })
    .workers(1)
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

async fn metrics_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    match render_metrics(&metrics) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn health_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    HttpResponse::Ok().json(TableHealth::from_metrics(&metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_of_idle_table() {
        let metrics = Metrics::new().unwrap();

        let health = TableHealth::from_metrics(&metrics);

        assert_eq!(health.status, "serving");
        assert_eq!(health.philosophers_eating, 0);
        assert_eq!(health.forks_held, 0);
        assert_eq!(health.meals, 0);
    }

    #[test]
    fn test_health_reports_dinner_progress() {
        let metrics = Metrics::new().unwrap();
        metrics.fork_picked_up();
        metrics.fork_picked_up();
        metrics.eating_started();
        metrics.eating_finished(3, 0.2);
        metrics.eating_started();
        metrics.record_reset();

        let health = TableHealth::from_metrics(&metrics);

        assert_eq!(health.status, "serving");
        assert_eq!(health.philosophers_eating, 1);
        assert_eq!(health.forks_held, 2);
        assert_eq!(health.meals, 1);
        assert_eq!(health.resets, 1);

        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["service"], "dining-philosophers");
        assert_eq!(json["meals"], 1);
    }

    #[test]
    fn test_health_flags_eater_without_forks() {
        let metrics = Metrics::new().unwrap();
        metrics.eating_started();

        assert_eq!(TableHealth::from_metrics(&metrics).status, "inconsistent");
    }

    #[test]
    fn test_render_metrics_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.record_backoff(1, "left");

        let body = String::from_utf8(render_metrics(&metrics).unwrap()).unwrap();

        assert!(body.contains("philosopher_backoffs_total"));
        assert!(body.contains("fork=\"left\""));
    }
}
