use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::CheckerError;
use crate::logging::LogContext;
use crate::export::{clean_bag_csv, render_breakdown, token_cells, CLEAN_BAG_HEADERS, SPAM_BAG_HEADERS};
use crate::pipeline::{BagChecker, BagReport};

/// File name offered by the clean bag download
pub const CLEAN_BAG_DOWNLOAD_NAME: &str = "clean_bag.csv";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Checker error: {0}")]
    Checker(#[from] CheckerError),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Server error: {0}")]
    Server(String),
}

impl From<&ApiError> for StatusCode {
    fn from(error: &ApiError) -> Self {
        match error {
            ApiError::Checker(CheckerError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Checker(CheckerError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Checker(CheckerError::Export(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Checker(_) => StatusCode::BAD_GATEWAY,
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Checker(CheckerError::Validation(_)) => "invalid_address",
            ApiError::Checker(CheckerError::Config(_)) => "configuration_error",
            ApiError::Checker(CheckerError::Provider(_)) => "provider_error",
            ApiError::Checker(CheckerError::Processing(_)) => "malformed_response",
            ApiError::Checker(CheckerError::Export(_)) => "export_error",
            ApiError::InvalidParameter(_) => "invalid_parameter",
            ApiError::Server(_) => "server_error",
        }
    }

    fn into_json(self) -> (StatusCode, Json<ErrorResponse>) {
        let status = StatusCode::from(&self);
        let context = LogContext::new("http_api", "check").with_error_code(self.code());
        if status.is_server_error() {
            context.error(&format!("Bag check failed: {}", self));
        } else {
            context.debug(&format!("Request rejected: {}", self));
        }
        (
            status,
            Json(ErrorResponse {
                error: self.code().to_string(),
                message: self.to_string(),
            }),
        )
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Response structure for the health endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Query parameters shared by the check and download endpoints
#[derive(Debug, Deserialize)]
pub struct CheckParams {
    #[serde(default)]
    pub address: Option<String>,
}

impl CheckParams {
    fn address(&self) -> Result<&str, ApiError> {
        match self.address.as_deref().map(str::trim) {
            Some(address) if !address.is_empty() => Ok(address),
            _ => Err(ApiError::InvalidParameter("address is required".to_string())),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<BagChecker>,
}

/// Form UI server
pub struct ApiServer {
    checker: Arc<BagChecker>,
    pub host: String,
    pub port: u16,
}

impl ApiServer {
    pub fn new(checker: Arc<BagChecker>, host: impl Into<String>, port: u16) -> Self {
        Self {
            checker,
            host: host.into(),
            port,
        }
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<(), ApiError> {
        let app = create_router(AppState {
            checker: self.checker.clone(),
        });

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        log::info!("Bag checker UI listening on http://{}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::Server(format!("Server error: {}", e)))?;

        Ok(())
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/check", get(check_page))
        .route("/api/check", get(check_json))
        .route("/download/clean.csv", get(download_clean_bag))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// GET / - address form
pub async fn index() -> Html<String> {
    Html(page("", &form("")))
}

/// GET /check - result page for one wallet
pub async fn check_page(Query(params): Query<CheckParams>, State(state): State<AppState>) -> (StatusCode, Html<String>) {
    let Ok(address) = params.address() else {
        let body = format!(
            "{}<p class=\"warning\">Enter an ENS name or address to begin!</p>",
            form("")
        );
        return (StatusCode::OK, Html(page("", &body)));
    };

    match state.checker.check(address).await {
        Ok(report) => {
            let image = state.checker.name_image_url(&report).await;
            let body = format!("{}{}", form(address), report_html(&report, image.as_deref()));
            (StatusCode::OK, Html(page(report.address.as_str(), &body)))
        }
        Err(e) => {
            let error = ApiError::from(e);
            let body = format!("{}<p class=\"error\">{}</p>", form(address), escape_html(&error.to_string()));
            (StatusCode::from(&error), Html(page(address, &body)))
        }
    }
}

/// GET /api/check - the full report as JSON
pub async fn check_json(
    Query(params): Query<CheckParams>,
    State(state): State<AppState>,
) -> Result<Json<BagReport>, (StatusCode, Json<ErrorResponse>)> {
    let address = params.address().map_err(ApiError::into_json)?;
    state
        .checker
        .check(address)
        .await
        .map(Json)
        .map_err(|e| ApiError::from(e).into_json())
}

/// GET /download/clean.csv - clean bag as a CSV attachment
pub async fn download_clean_bag(
    Query(params): Query<CheckParams>,
    State(state): State<AppState>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let address = params.address().map_err(ApiError::into_json)?;
    let report = state
        .checker
        .check(address)
        .await
        .map_err(|e| ApiError::from(e).into_json())?;
    let body = clean_bag_csv(&report.clean)
        .map_err(|e| ApiError::from(CheckerError::from(e)).into_json())?;

    let disposition = format!("attachment; filename=\"{}\"", CLEAN_BAG_DOWNLOAD_NAME);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn page(subject: &str, body: &str) -> String {
    let title = if subject.is_empty() {
        "NFT Bag Checker".to_string()
    } else {
        format!("NFT Bag Checker: {}", escape_html(subject))
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n<h1>NFT Bag Checker</h1>\n{}\n</body>\n</html>\n",
        title, body
    )
}

fn form(address: &str) -> String {
    format!(
        "<form action=\"/check\" method=\"get\"><label>Enter your ENS name or wallet address \
         <input type=\"text\" name=\"address\" value=\"{}\"></label> <button type=\"submit\">Submit</button></form>",
        escape_html(address)
    )
}

fn report_html(report: &BagReport, image: Option<&str>) -> String {
    let summary = &report.summary;
    let mut html = String::new();

    if let Some(image) = image {
        html.push_str(&format!("<img src=\"{}\" alt=\"name image\" width=\"200\">\n", escape_html(image)));
    }

    html.push_str("<div class=\"metrics\">\n");
    html.push_str(&format!(
        "<p>Legit NFTs: <strong>{}</strong></p><pre>{}</pre>\n",
        summary.clean_count,
        escape_html(&render_breakdown(&summary.clean_token_types))
    ));
    html.push_str(&format!(
        "<p>Spam NFTs: <strong>{}</strong></p><pre>{}</pre>\n",
        summary.spam_count,
        escape_html(&render_breakdown(&summary.spam_token_types))
    ));
    html.push_str("</div>\n");

    for failure in &report.fetch_failures {
        html.push_str(&format!(
            "<p class=\"warning\">The {} query stopped after {} page(s): {}. The address likely has no holdings, verify manually.</p>\n",
            escape_html(&failure.query),
            failure.pages_collected,
            escape_html(&failure.message)
        ));
    }

    let clean_rows: Vec<Vec<String>> = report
        .clean
        .iter()
        .map(|row| {
            let mut cells = token_cells(&row.token).to_vec();
            cells.extend(row.price.display_cells());
            cells
        })
        .collect();
    let spam_rows: Vec<Vec<String>> = report.spam.iter().map(|row| token_cells(row).to_vec()).collect();

    html.push_str("<h2>Clean bag</h2>\n");
    html.push_str(&html_table(&CLEAN_BAG_HEADERS, &clean_rows));
    html.push_str(&format!(
        "<p><a href=\"{}\" download=\"{}\">Download clean bag as CSV</a></p>\n",
        escape_html(&download_href(report.address.as_str())),
        CLEAN_BAG_DOWNLOAD_NAME
    ));
    html.push_str("<h2>Spam bag</h2>\n");
    html.push_str(&html_table(&SPAM_BAG_HEADERS, &spam_rows));
    html
}

fn html_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table>\n<tr>");
    for header in headers {
        html.push_str(&format!("<th>{}</th>", header));
    }
    html.push_str("</tr>\n");

    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n");
    html
}

fn download_href(address: &str) -> String {
    let encoded = Url::parse_with_params("http://localhost/download/clean.csv", &[("address", address)])
        .ok()
        .and_then(|url| url.query().map(str::to_string))
        .unwrap_or_default();
    format!("/download/clean.csv?{}", encoded)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ValidationError};

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"Ape\" & 'Co'</b>"), "&lt;b&gt;&quot;Ape&quot; &amp; &#39;Co&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_download_href_encodes_address() {
        assert_eq!(download_href("vitalik.eth"), "/download/clean.csv?address=vitalik.eth");
        assert_eq!(download_href("a b"), "/download/clean.csv?address=a+b");
    }

    #[test]
    fn test_error_status_mapping() {
        let invalid = ApiError::from(CheckerError::Validation(ValidationError::InvalidAddress("x".to_string())));
        assert_eq!(StatusCode::from(&invalid), StatusCode::BAD_REQUEST);

        let upstream = ApiError::from(CheckerError::Provider(ProviderError::Timeout { seconds: 30 }));
        assert_eq!(StatusCode::from(&upstream), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.code(), "provider_error");

        let missing = ApiError::InvalidParameter("address is required".to_string());
        assert_eq!(StatusCode::from(&missing), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_address_param() {
        assert!(CheckParams { address: None }.address().is_err());
        assert!(CheckParams { address: Some("  ".to_string()) }.address().is_err());
        assert_eq!(CheckParams { address: Some(" abc.eth ".to_string()) }.address().unwrap(), "abc.eth");
    }
}
