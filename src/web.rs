//! 提供給儀表板的 JSON API。

use std::{str::FromStr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    analyzer::Analyzer,
    declare::FiscalPeriod,
    error::{ErrorKind, FinanceError},
    logging,
};

pub type AppState = Arc<Analyzer>;

/// API 錯誤
#[derive(Debug)]
pub enum ApiError {
    Finance(FinanceError),
    BadRequest(String),
}

impl From<FinanceError> for ApiError {
    fn from(value: FinanceError) -> Self {
        ApiError::Finance(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad request", message.clone()),
            ApiError::Finance(why) => match why.kind() {
                ErrorKind::Lookup => (StatusCode::NOT_FOUND, "company not found", why.to_string()),
                ErrorKind::DataUnavailable => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "data temporarily unavailable",
                    why.to_string(),
                ),
                ErrorKind::MalformedData | ErrorKind::CacheIo => {
                    logging::error_file_async(format!("Unexpected error surfaced to api: {}", why));
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error", why.to_string())
                }
            },
        };

        let body = serde_json::json!({
            "error": error,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// 例如 `2024Q4` 或 `2024`
    pub period: Option<String>,
}

impl PeriodQuery {
    fn parse(&self) -> Result<Option<FiscalPeriod>, ApiError> {
        match self.period.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => FiscalPeriod::from_str(raw)
                .map(Some)
                .map_err(ApiError::BadRequest),
        }
    }
}

pub fn build_router(analyzer: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/companies", get(list_companies))
        .route("/api/companies/{code}/indicators", get(get_indicators))
        .route("/api/companies/{code}/insights", get(get_insights))
        .route("/api/companies/{code}/report", get(get_report))
        .with_state(analyzer)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn list_companies(State(analyzer): State<AppState>) -> impl IntoResponse {
    Json(analyzer.companies())
}

async fn get_indicators(
    State(analyzer): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(analyzer.indicators(&code).await?))
}

/// 未指定期別時回傳最新一期的判讀
async fn get_insights(
    State(analyzer): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let insights = match query.parse()? {
        Some(period) => analyzer.insights(&code, period).await?,
        None => analyzer.report(&code, None).await?.insights,
    };

    Ok(Json(insights))
}

async fn get_report(
    State(analyzer): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let period = query.parse()?;
    Ok(Json(analyzer.report(&code, period).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use crate::analyzer::tests::{fixture_analyzer, fixture_transport, FixtureTransport};

    use super::*;

    async fn call(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn app(dir: &std::path::Path) -> Router {
        build_router(Arc::new(fixture_analyzer(Arc::new(fixture_transport()), dir)))
    }

    #[tokio::test]
    async fn test_list_companies() {
        let dir = tempfile::tempdir().unwrap();
        let (status, json) = call(app(dir.path()), "/api/companies").await;

        assert_eq!(status, StatusCode::OK);
        let companies = json.as_array().unwrap();
        assert_eq!(companies.len(), 7);
        assert_eq!(companies[1]["code"], "2727");
        assert_eq!(companies[1]["exchange"], "twse");
    }

    #[tokio::test]
    async fn test_indicators_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let (status, json) = call(app.clone(), "/api/companies/2727/indicators").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["company_code"], "2727");
        assert_eq!(json["basis"], "sequential");
        let points = json["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert!(points[0]["revenue_growth"].is_null());
        assert_eq!(points[1]["period"], "2024Q4");
        assert_eq!(points[1]["revenue_growth"].as_f64(), Some(0.15));

        let (status, json) = call(app, "/api/companies/2727/report").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["period"], "2024Q4");
        assert_eq!(json["company"]["name"], "王品");
        assert_eq!(json["insights"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_insights_with_period() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let (status, json) = call(app.clone(), "/api/companies/2727/insights?period=2023Q4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);

        let (status, json) = call(app, "/api/companies/2727/insights?period=2024Q9").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "bad request");
    }

    #[tokio::test]
    async fn test_unknown_company_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (status, json) = call(app(dir.path()), "/api/companies/9999/report").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "company not found");
    }

    #[tokio::test]
    async fn test_unavailable_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let offline = Arc::new(FixtureTransport {
            calls: AtomicUsize::new(0),
            responses: Vec::new(),
        });
        let app = build_router(Arc::new(fixture_analyzer(offline, dir.path())));

        let (status, json) = call(app, "/api/companies/2727/indicators").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "data temporarily unavailable");
    }
}
