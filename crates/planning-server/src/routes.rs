//! HTTP routes.
//!
//! - `GET {route}` (default `/jr.ics`): the calendar feed, rebuilt on every request
//! - `GET /health`: liveness probe

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use planning_core::{CalendarPipeline, DateRange};
use planning_source::ScheduleSource;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::HEALTH_ROUTE;
use crate::error::{ServerError, ServerResult};

/// Content type of the feed.
pub const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// State shared by the handlers.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn ScheduleSource>,
    pipeline: Arc<CalendarPipeline>,
    horizon_months: Option<u32>,
}

impl AppState {
    pub fn new(source: Arc<dyn ScheduleSource>, pipeline: CalendarPipeline) -> Self {
        Self {
            source,
            pipeline: Arc::new(pipeline),
            horizon_months: None,
        }
    }

    /// Builder: publish only shifts from today through `months` ahead.
    pub fn with_horizon(mut self, months: Option<u32>) -> Self {
        self.horizon_months = months;
        self
    }

    /// Pipeline for a request served at `now`.
    fn pipeline_at(&self, now: DateTime<Utc>) -> CalendarPipeline {
        let pipeline = self.pipeline.as_ref().clone();
        match self.horizon_months {
            Some(months) => {
                let today = pipeline.zone().local_date(now);
                pipeline.with_date_range(Some(DateRange::months_ahead(today, months)))
            }
            None => pipeline,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Builds the router with the feed mounted at `route`.
pub fn build_router(state: AppState, route: &str) -> Router {
    Router::new()
        .route(HEALTH_ROUTE, get(health_check))
        .route(route, get(calendar_feed))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn calendar_feed(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    let now = Utc::now();
    let pipeline = state.pipeline_at(now);
    let ics = render_feed(state.source.as_ref(), &pipeline, now).await?;
    Ok(([(header::CONTENT_TYPE, CALENDAR_CONTENT_TYPE)], ics))
}

/// Fetches the planning from `source` and renders it.
///
/// Failures are logged here, once, with their cause.
pub async fn render_feed(
    source: &dyn ScheduleSource,
    pipeline: &CalendarPipeline,
    now: DateTime<Utc>,
) -> ServerResult<String> {
    let html = source.fetch_html().await.map_err(|e| {
        error!(source = source.name(), error = %e, "Failed to fetch planning");
        ServerError::from(e)
    })?;

    let ics = pipeline.render_at(&html, now).map_err(|e| {
        error!(error = %e, "Failed to encode calendar");
        ServerError::from(e)
    })?;

    info!(
        source = source.name(),
        html_bytes = html.len(),
        ics_bytes = ics.len(),
        "Served planning feed"
    );
    Ok(ics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ENCODE_FAILED_MESSAGE, FETCH_FAILED_MESSAGE};
    use planning_core::{OutputMode, PipelineConfig};
    use planning_source::{FailingSource, SourceErrorCode, StaticSource};
    use reqwest::StatusCode;

    fn planning_html(day: &str) -> String {
        let mut cells = vec![String::new(); 35];
        cells[1] = day.to_string();
        cells[6] = "JR".to_string();
        cells[34] = "JR".to_string();
        let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
        format!("<table><tr>{}</tr></table>", tds)
    }

    fn utc_pipeline() -> CalendarPipeline {
        CalendarPipeline::new(PipelineConfig::default().with_output_mode(OutputMode::Utc)).unwrap()
    }

    /// Serves `state` on an ephemeral port and returns its base URL.
    async fn spawn(state: AppState, route: &str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(state, route);
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn serves_calendar() {
        let source = Arc::new(StaticSource::new(planning_html("15/03/2025")));
        let base = spawn(AppState::new(source, utc_pipeline()), "/jr.ics").await;

        let response = reqwest::Client::new()
            .get(format!("{}/jr.ics", base))
            .header("Origin", "https://calendar.example.org")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            CALENDAR_CONTENT_TYPE
        );
        assert_eq!(
            response.headers()["access-control-allow-origin"].to_str().unwrap(),
            "*"
        );

        let body = response.text().await.unwrap();
        assert!(body.starts_with("BEGIN:VCALENDAR\r\n"));
        assert_eq!(body.matches("BEGIN:VEVENT").count(), 2);
        assert!(body.contains("SUMMARY:JR — Matin — SCANNER1\r\n"));
        assert!(body.contains("DTSTART:20250315T070000Z\r\n"));
        assert!(body.contains("SUMMARY:JR — Astreinte du soir\r\n"));
    }

    #[tokio::test]
    async fn custom_route() {
        let source = Arc::new(StaticSource::new(planning_html("15/03/2025")));
        let base = spawn(AppState::new(source, utc_pipeline()), "/planning/feed.ics").await;

        let ok = reqwest::get(format!("{}/planning/feed.ics", base)).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let missing = reqwest::get(format!("{}/jr.ics", base)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn source_failure_is_bad_gateway() {
        let source = Arc::new(FailingSource::new(SourceErrorCode::Network, "unreachable"));
        let base = spawn(AppState::new(source, utc_pipeline()), "/jr.ics").await;

        let response = reqwest::get(format!("{}/jr.ics", base)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.text().await.unwrap(), FETCH_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn encode_failure_response() {
        let failure = ServerError::from(planning_core::EncodeError::UnknownZone {
            zone: "Nowhere".to_string(),
        });
        let response = failure.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], ENCODE_FAILED_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn health_endpoint() {
        let source = Arc::new(StaticSource::new(""));
        let base = spawn(AppState::new(source, utc_pipeline()), "/jr.ics").await;

        let response = reqwest::get(format!("{}/health", base)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse =
            serde_json::from_str(&response.text().await.unwrap()).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn horizon_limits_published_shifts() {
        let now = Utc::now();
        let today = utc_pipeline().zone().local_date(now);
        let past = today - chrono::Duration::days(40);
        let html = format!(
            "{}{}",
            planning_html(&past.format("%d/%m/%Y").to_string()),
            planning_html(&today.format("%d/%m/%Y").to_string())
        );

        let state = AppState::new(Arc::new(StaticSource::new(html)), utc_pipeline())
            .with_horizon(Some(2));
        let pipeline = state.pipeline_at(now);
        let ics = render_feed(state.source.as_ref(), &pipeline, now).await.unwrap();
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);

        let unbounded = AppState::new(state.source.clone(), utc_pipeline());
        let ics = render_feed(unbounded.source.as_ref(), &unbounded.pipeline_at(now), now)
            .await
            .unwrap();
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 4);
    }
}
