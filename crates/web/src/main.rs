mod cli;
mod metrics;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use board::client::LeaderboardClient;
use board::config::{Config, Web};
use board::cycle::{LeaderboardSync, LOADING_STATUS};
use board::observability::{build_dispatch, LogFormat};
use board::scheduler::{self, JobSpec};
use board::sinks::{BoardSnapshot, BoardState};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use models::BoardView;
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub board: Arc<BoardState>,
    pub started_at: DateTime<Utc>,
    pub metrics: Option<PrometheusHandle>,
}

// --- Templates ---

#[derive(Template)]
#[template(path = "board.html")]
struct BoardPageTemplate {
    view: BoardView,
}

#[derive(Template)]
#[template(path = "partials/board.html")]
struct BoardPartialTemplate {
    view: BoardView,
}

fn render_html<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "template render failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- Handlers ---

async fn index(State(state): State<Arc<AppState>>) -> Response {
    render_html(&BoardPageTemplate {
        view: state.board.snapshot().into(),
    })
}

async fn board_partial(State(state): State<Arc<AppState>>) -> Response {
    render_html(&BoardPartialTemplate {
        view: state.board.snapshot().into(),
    })
}

async fn board_json(State(state): State<Arc<AppState>>) -> Json<BoardSnapshot> {
    Json(state.board.snapshot())
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> Response {
    let Some(handle) = &state.metrics else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    handle.run_upkeep();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response()
}

// --- Router ---

pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/partials/board", get(board_partial))
        .route("/api/board", get(board_json))
        .route("/api/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let invocation = cli::parse_args(std::env::args()).map_err(anyhow::Error::msg)?;
    if let cli::Command::Normalize { url } = &invocation.command {
        cli::show_normalized(url);
        return Ok(());
    }

    let config_path = invocation
        .config_path
        .unwrap_or_else(Config::default_config_path);
    let config = Config::load(&config_path)?;

    let (dispatch, _otel_guard) = build_dispatch(
        "leaderboard-web",
        &config.general.log_level,
        LogFormat::parse(&config.general.log_format),
    );
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)?;
    tracing::info!(path = %config_path, "leaderboard-web starting");

    if invocation.command == cli::Command::Once {
        return cli::run_once(&config).await;
    }

    let prometheus = metrics::init_global()?;

    let board = Arc::new(BoardState::new(LOADING_STATUS));
    let client = LeaderboardClient::from_config(&config.backend)?;
    let sync = Arc::new(
        LeaderboardSync::new(
            config.backend.base_url.clone(),
            client,
            board.clone(),
            board.clone(),
        )
        .with_badges(config.badges.clone()),
    );
    if config.backend.base_url.is_none() {
        tracing::warn!("backend.base_url is not set; cycles will report a configuration error");
    }

    let schedule = scheduler::start(
        JobSpec {
            name: "leaderboard_sync".to_string(),
            interval: Duration::from_secs(config.sync.interval_secs),
            run_immediately: config.sync.run_immediately,
        },
        move || {
            let sync = sync.clone();
            async move {
                sync.run_once().await;
            }
        },
    );

    let web = config.web.clone().unwrap_or(Web {
        port: 8080,
        host: "0.0.0.0".to_string(),
    });
    let state = Arc::new(AppState {
        board,
        started_at: Utc::now(),
        metrics: Some(prometheus),
    });
    let app = create_router_with_state(state);

    let addr: SocketAddr = format!("{}:{}", web.host, web.port).parse()?;
    tracing::info!(%addr, "dashboard listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    schedule.stop().await;
    tracing::info!("leaderboard-web stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use board::config::Badges;
    use board::render::render_row;
    use board::sinks::{RowSink, StatusSink};
    use board::types::{LeaderboardRow, RowFlags};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn sample_row() -> LeaderboardRow {
        LeaderboardRow {
            rank: 1,
            display_name: "Alice".to_string(),
            address: "0xabc".to_string(),
            polymarket_profile_url: "https://polymarket.com/profile/0xabc".to_string(),
            portfolio_value: 100.5,
            pnl_realized: -2.345,
            pnl_unrealized: 0.0,
            flags: RowFlags {
                large_deposit: true,
                has_withdrawals: false,
                non_fresh: false,
            },
        }
    }

    fn create_test_app(board: Arc<BoardState>) -> Router {
        let state = Arc::new(AppState {
            board,
            started_at: Utc::now(),
            metrics: Some(PrometheusBuilder::new().build_recorder().handle()),
        });
        create_router_with_state(state)
    }

    fn filled_board() -> Arc<BoardState> {
        let board = Arc::new(BoardState::new(LOADING_STATUS));
        board.replace_rows(vec![render_row(&sample_row(), &Badges::default()).unwrap()]);
        board.set_status("Updated at 12:34:56");
        board
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_renders_full_page() {
        let (status, html) = get_body(create_test_app(filled_board()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<title>Leaderboard</title>"));
        assert!(html.contains("hx-get=\"/partials/board\""));
        assert!(html.contains("Updated at 12:34:56"));
        assert!(html.contains("Alice"));
    }

    #[tokio::test]
    async fn test_partial_renders_rows() {
        let (status, html) = get_body(create_test_app(filled_board()), "/partials/board").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!html.contains("<html"));
        assert!(html.contains("0xabc"));
        assert!(html.contains("$100.50"));
        assert!(html.contains("$-2.35"));
        assert!(html.contains("$0.00"));
        assert!(html.contains("class=\"number-negative\""));
        assert!(html.contains("target=\"_blank\""));
        assert!(html.contains("rel=\"noopener noreferrer\""));
        assert!(html.contains("flag-deposit"));
        assert!(!html.contains("flag-withdraw"));
        assert!(html.contains("Rows as of"));
    }

    #[tokio::test]
    async fn test_partial_escapes_display_name() {
        let board = Arc::new(BoardState::default());
        let mut row = sample_row();
        row.display_name = "<script>x</script>".to_string();
        board.replace_rows(vec![render_row(&row, &Badges::default()).unwrap()]);

        let (_, html) = get_body(create_test_app(board), "/partials/board").await;
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("script"));
    }

    #[tokio::test]
    async fn test_partial_before_first_cycle() {
        let board = Arc::new(BoardState::new(LOADING_STATUS));
        let (status, html) = get_body(create_test_app(board), "/partials/board").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Loading..."));
        assert!(html.contains("Nothing to show"));
        assert!(!html.contains("Rows as of"));
    }

    #[tokio::test]
    async fn test_api_board_json() {
        let (status, body) = get_body(create_test_app(filled_board()), "/api/board").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "Updated at 12:34:56");
        assert_eq!(json["rows"][0]["realized"]["text"], "$-2.35");
        assert_eq!(json["rows"][0]["realized"]["tone"], "negative");
        assert_eq!(json["rows"][0]["badges"][0]["label"], "D");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) =
            get_body(create_test_app(Arc::new(BoardState::default())), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["uptime_secs"].as_i64().unwrap() >= 0);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (status, _) =
            get_body(create_test_app(Arc::new(BoardState::default())), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_unavailable_without_recorder() {
        let state = Arc::new(AppState {
            board: Arc::new(BoardState::default()),
            started_at: Utc::now(),
            metrics: None,
        });
        let (status, _) = get_body(create_router_with_state(state), "/metrics").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_route_404() {
        let (status, _) =
            get_body(create_test_app(Arc::new(BoardState::default())), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
