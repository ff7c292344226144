use actix_web::{HttpResponse, Responder, get, web};

use super::AppState;
use crate::monitoring::types::{DeviceStatus, Observation, TIMESTAMP_FORMAT};

/// How many records the dashboard shows, newest first. Presentation
/// window only; the log itself keeps full history.
const RECENT_WINDOW: usize = 20;

/// How often the page polls the change oracle, in milliseconds.
const POLL_INTERVAL_MS: u64 = 25_000;

const STARTING_UP_PAGE: &str = r#"<html>
<head>
    <meta http-equiv="refresh" content="5">
    <title>Network Monitor - Starting Up</title>
</head>
<body>
    <h1>Network Monitoring Dashboard</h1>
    <p>Monitoring system starting up, no data recorded yet.</p>
    <p>This page refreshes automatically.</p>
</body>
</html>
"#;

/// Dashboard page: current status, stats over the recent window, and a
/// polling script that reloads when the change oracle reports new data.
#[get("/")]
pub async fn dashboard(state: web::Data<AppState>) -> impl Responder {
    let observations = match state.log.read_all().await {
        Ok(observations) => observations,
        Err(error) => {
            tracing::error!("failed to read status log: {error:#}");
            return HttpResponse::InternalServerError().body("status log unavailable");
        }
    };

    let body = if observations.is_empty() {
        STARTING_UP_PAGE.to_string()
    } else {
        render_page(&observations, state.oracle.watermark().as_millis())
    };

    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body)
}

#[allow(clippy::cast_precision_loss)]
fn render_page(observations: &[Observation], watermark: i64) -> String {
    let recent: Vec<&Observation> = observations.iter().rev().take(RECENT_WINDOW).collect();

    let up_count = recent.iter().filter(|o| o.status == DeviceStatus::Up).count();
    let down_count = recent.len() - up_count;
    let uptime_percent = (up_count as f64 / recent.len() as f64 * 100.0 * 100.0).round() / 100.0;

    let current = recent[0];
    let status_color = match current.status {
        DeviceStatus::Up => "green",
        DeviceStatus::Down => "red",
    };

    let rows: String = recent.iter().map(|o| row_html(o)).collect();

    format!(
        r#"<html>
<head>
    <title>Network Monitor</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body {{ font-family: sans-serif; margin: 2em; }}
        .summary {{ margin-bottom: 1.5em; }}
        .stats span {{ margin-right: 2em; }}
        table {{ border-collapse: collapse; width: 100%; }}
        th, td {{ padding: 0.5em 1em; text-align: left; border-bottom: 1px solid #ddd; }}
        .status-up {{ color: green; font-weight: bold; }}
        .status-down {{ color: red; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Network Monitor</h1>
    <div class="summary">
        <p>Current status:
            <span style="color: {status_color}; font-weight: bold;">{current_status}</span>
            ({current_device})</p>
        <p class="stats">
            <span>Up: {up_count}</span>
            <span>Down: {down_count}</span>
            <span>Uptime: {uptime_percent}%</span>
            <span>Showing last {shown} of {total} checks, newest first</span>
        </p>
    </div>
    <table>
        <tr><th>Timestamp</th><th>Device Name</th><th>Address</th><th>Status</th></tr>
{rows}    </table>
    <script>
        let checkpoint = {watermark};
        setInterval(function() {{
            fetch('/changed?checkpoint=' + checkpoint)
                .then(r => r.json())
                .then(data => {{
                    checkpoint = data.watermark;
                    if (data.changed) {{
                        location.reload();
                    }}
                }})
                .catch(error => console.log('update check failed:', error));
        }}, {poll_interval});
    </script>
</body>
</html>
"#,
        current_status = current.status,
        current_device = escape(&current.device_name),
        shown = recent.len(),
        total = observations.len(),
        poll_interval = POLL_INTERVAL_MS,
    )
}

fn row_html(observation: &Observation) -> String {
    let status_class = match observation.status {
        DeviceStatus::Up => "status-up",
        DeviceStatus::Down => "status-down",
    };

    format!(
        "        <tr><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td></tr>\n",
        observation.timestamp.format(TIMESTAMP_FORMAT),
        escape(&observation.device_name),
        escape(&observation.address),
        status_class,
        observation.status,
    )
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use tempfile::tempdir;

    use super::*;
    use crate::storage::{ChangeOracle, CsvStatusLog, StatusLog};

    #[actix_web::test]
    async fn empty_log_renders_the_starting_up_page() {
        let dir = tempdir().unwrap();
        let log: Arc<dyn StatusLog> =
            Arc::new(CsvStatusLog::open(dir.path().join("log.csv")).await.unwrap());
        let state = AppState { log: log.clone(), oracle: ChangeOracle::new(log) };

        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).service(dashboard))
                .await;
        let body =
            test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;

        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("Starting Up"));
    }

    #[actix_web::test]
    async fn dashboard_shows_recent_records_newest_first() {
        let dir = tempdir().unwrap();
        let log: Arc<dyn StatusLog> =
            Arc::new(CsvStatusLog::open(dir.path().join("log.csv")).await.unwrap());

        log.append(&Observation::now("Router", "10.0.0.1", DeviceStatus::Up)).await.unwrap();
        log.append(&Observation::now("Google DNS", "8.8.8.8", DeviceStatus::Down)).await.unwrap();

        let state = AppState { log: log.clone(), oracle: ChangeOracle::new(log) };
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).service(dashboard))
                .await;
        let body =
            test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;

        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("Google DNS"));
        assert!(page.contains("Router"));
        // Newest record first in the table.
        assert!(page.find("Google DNS").unwrap() < page.find("Router").unwrap());
        assert!(page.contains("Uptime: 50%"));
    }
}
