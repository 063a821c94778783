use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockscope_core::domain::{market, NewsArticle, TickerMatch};
use stockscope_core::report;
use stockscope_core::service::StockService;
use stockscope_core::time::window;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockscope_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let source = match stockscope_core::market_data::from_settings(&settings) {
        Ok(source) => source,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format_args!("{err:#}"), "market data source misconfigured");
            return Err(err);
        }
    };
    let state = AppState {
        service: StockService::new(source),
        lookback_days: settings.lookback_days,
    };

    let provider = state.service.provider_name();
    let app = router(state).layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, provider, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/stocks/analyze", get(analyze))
        .route("/api/stocks/price", get(get_price))
        .route("/api/stocks/news", get(get_news))
        .route("/api/stocks/search", get(search))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: StockService,
    lookback_days: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ReportFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeParams {
    ticker: String,
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(default)]
    format: ReportFormat,
}

#[derive(Debug, Deserialize)]
struct TickerParams {
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
}

#[derive(Debug, Serialize)]
struct PriceResponse {
    ticker: String,
    price: Decimal,
}

async fn analyze(State(state): State<AppState>, Query(params): Query<AnalyzeParams>) -> Response {
    let ticker = match market::parse_ticker(&params.ticker) {
        Ok(t) => t,
        Err(err) => return (StatusCode::BAD_REQUEST, format!("{err:#}")).into_response(),
    };

    let window = match window::resolve_window(
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        window::today_utc(),
        state.lookback_days,
    ) {
        Ok(w) => w,
        Err(err) => {
            tracing::debug!(%ticker, error = %format_args!("{err:#}"), "rejected analysis window");
            return (StatusCode::BAD_REQUEST, format!("{err:#}")).into_response();
        }
    };

    let report = state.service.analyze(&ticker, window).await;
    if !report.has_price_data() {
        return (
            StatusCode::NOT_FOUND,
            "No stock data found for the given ticker.",
        )
            .into_response();
    }

    match params.format {
        ReportFormat::Text => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            report::render_text(&report),
        )
            .into_response(),
        ReportFormat::Json => Json(report).into_response(),
    }
}

async fn get_price(
    State(state): State<AppState>,
    Query(params): Query<TickerParams>,
) -> Result<Json<PriceResponse>, (StatusCode, &'static str)> {
    let ticker = market::parse_ticker(&params.ticker)
        .map_err(|_| (StatusCode::BAD_REQUEST, "invalid ticker symbol"))?;

    let price = state
        .service
        .current_price(&ticker)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Stock not found"))?;

    Ok(Json(PriceResponse { ticker, price }))
}

async fn get_news(
    State(state): State<AppState>,
    Query(params): Query<TickerParams>,
) -> Result<Json<Vec<NewsArticle>>, StatusCode> {
    let ticker = market::parse_ticker(&params.ticker).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok(Json(state.service.news(&ticker).await))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<TickerMatch>> {
    Json(state.service.search(&params.query).await)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &stockscope_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
