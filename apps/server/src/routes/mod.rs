use std::sync::Arc;

use actix_web::web;

use crate::storage::{ChangeOracle, StatusLog};

pub mod dashboard;
pub mod health;
pub mod status;

/// Read-only state shared with every request handler.
#[derive(Clone)]
pub struct AppState {
    pub log: Arc<dyn StatusLog>,
    pub oracle: ChangeOracle,
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health_route)
        .service(status::current_status)
        .service(status::changed)
        .service(dashboard::dashboard);
}
