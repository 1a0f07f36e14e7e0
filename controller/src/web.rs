use std::{collections::HashMap, path::Path};

use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use irrigation_common::{Mode, MotorState, OperatorCommands, SharedStatus, StatusStore};
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::info;

const REFRESH_INTERVAL_MS: u64 = 3_000;
const UNKNOWN_VALUE: &str = "--";
const LOGO_SVG: &str = include_str!("../web/logo.svg");

#[derive(Clone)]
struct AppState {
    store: StatusStore,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// The logo is compiled in; anything else is looked up under `web_root`.
pub fn router(store: StatusStore, web_root: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/logo.svg", get(handle_logo))
        .route("/mode", post(handle_set_mode))
        .route("/motor", post(handle_set_motor))
        .fallback_service(ServeDir::new(web_root))
        .with_state(AppState { store })
}

async fn handle_index(State(state): State<AppState>) -> Html<String> {
    let status = state.store.snapshot();
    let commands = state.store.commands();
    Html(render_page(&status, &commands))
}

async fn handle_logo() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], LOGO_SVG)
}

async fn handle_set_mode(
    State(state): State<AppState>,
    Form(params): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(value) = params.get("mode") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'mode' field");
    };
    let Some(mode) = Mode::parse(value) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid mode. Use 'AUTO' or 'MANUAL'",
        );
    };

    let previous = state.store.set_mode(mode);
    if previous != mode {
        info!("mode {} -> {}", previous.as_str(), mode.as_str());
    }

    Redirect::to("/").into_response()
}

async fn handle_set_motor(
    State(state): State<AppState>,
    Form(params): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(value) = params.get("action") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'action' field");
    };
    let Some(motor) = MotorState::parse(value) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid action. Use 'ON' or 'OFF'");
    };

    state.store.set_manual_motor(motor);
    let mode = state.store.commands().mode;
    if mode == Mode::Manual {
        info!("manual pump request {}", motor.as_str());
    } else {
        info!(
            "manual pump request {} stored; applies once mode is MANUAL",
            motor.as_str()
        );
    }

    Redirect::to("/").into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn render_page(status: &SharedStatus, commands: &OperatorCommands) -> String {
    let moisture = status
        .moisture_percent
        .map_or_else(|| UNKNOWN_VALUE.to_string(), |value| value.to_string());
    let voltage = status
        .voltage
        .map_or_else(|| UNKNOWN_VALUE.to_string(), |value| format!("{value:.2}"));
    let progress = status.moisture_percent.unwrap_or(0);

    let mode_class = match commands.mode {
        Mode::Auto => "auto",
        Mode::Manual => "manual",
    };
    let motor_class = if status.motor.is_on() { "on" } else { "off" };

    PAGE_TEMPLATE
        .replace("{{refresh_ms}}", &REFRESH_INTERVAL_MS.to_string())
        .replace("{{mode}}", commands.mode.as_str())
        .replace("{{mode_class}}", mode_class)
        .replace("{{manual_motor}}", commands.manual_motor.as_str())
        .replace("{{moisture}}", &moisture)
        .replace("{{progress}}", &progress.to_string())
        .replace("{{voltage}}", &voltage)
        .replace("{{motor}}", status.motor.as_str())
        .replace("{{motor_class}}", motor_class)
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Smart Irrigation</title>
<style>
  body { margin: 0; font-family: 'Segoe UI', Arial, sans-serif; background: linear-gradient(135deg, #f1c40f, #f39c12); color: #2c3e50; }
  .container { max-width: 420px; margin: auto; padding: 15px; }
  .header { display: flex; align-items: center; gap: 14px; color: white; margin-bottom: 20px; }
  .header img { width: 80px; height: 80px; border-radius: 16px; background: white; padding: 6px; }
  .header h2 { margin: 0; font-size: 22px; }
  .header p { margin: 4px 0 0; font-size: 13px; opacity: 0.9; }
  .card { background: white; border-radius: 15px; padding: 18px; margin-bottom: 15px; box-shadow: 0 10px 25px rgba(0,0,0,0.15); }
  .title { font-size: 14px; text-transform: uppercase; color: #7f8c8d; margin-bottom: 5px; }
  .value { font-size: 28px; font-weight: bold; }
  .badge { font-weight: bold; padding: 8px 14px; border-radius: 20px; color: white; display: inline-block; }
  .auto { background: #e67e22; }
  .manual { background: #27ae60; }
  .motor-on { color: #27ae60; }
  .motor-off { color: #c0392b; }
  .btn { width: 100%; padding: 14px; margin-top: 10px; font-size: 16px; border-radius: 12px; border: none; cursor: pointer; font-weight: bold; color: white; }
  .btn-auto { background: #2ecc71; }
  .btn-manual { background: #f39c12; }
  .btn-on { background: #27ae60; }
  .btn-off { background: #c0392b; }
  .progress { background: #ecf0f1; border-radius: 20px; overflow: hidden; height: 20px; margin-top: 10px; }
  .progress-bar { height: 100%; width: {{progress}}%; background: linear-gradient(90deg, #3498db, #2ecc71); }
  .hint { margin-top: 8px; font-size: 13px; color: #7f8c8d; }
  footer { text-align: center; color: white; font-size: 12px; opacity: 0.85; margin-top: 10px; }
</style>
</head>
<body>
<div class="container">

  <div class="header">
    <img src="/logo.svg" alt="Logo">
    <div>
      <h2>Smart Irrigation System</h2>
      <p>Automatic soil-moisture watering</p>
    </div>
  </div>

  <div class="card">
    <div class="title">System mode</div>
    <div class="value"><span class="badge {{mode_class}}">{{mode}}</span></div>
    <form method="post" action="/mode">
      <button class="btn btn-auto" name="mode" value="AUTO">AUTO</button>
      <button class="btn btn-manual" name="mode" value="MANUAL">MANUAL</button>
    </form>
  </div>

  <div class="card">
    <div class="title">Soil moisture</div>
    <div class="value">{{moisture}} %</div>
    <div class="progress"><div class="progress-bar"></div></div>
    <p class="hint">Sensor voltage: {{voltage}} V</p>
  </div>

  <div class="card">
    <div class="title">Pump</div>
    <div class="value motor-{{motor_class}}">{{motor}}</div>
    <form method="post" action="/motor">
      <button class="btn btn-on" name="action" value="ON">TURN ON</button>
      <button class="btn btn-off" name="action" value="OFF">TURN OFF</button>
    </form>
    <p class="hint">Manual request: {{manual_motor}} (used in MANUAL mode)</p>
  </div>

  <footer>Refreshes every 3 seconds</footer>

</div>
<script>
setTimeout(() => location.reload(), {{refresh_ms}});
</script>
</body>
</html>
"##;
