//! Reference datasets for the dashboard panels.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::services::catalog;
use crate::types::{Alert, DataSourceNote, Segment, SupplyComponent};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DatasetResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
}

impl<T> DatasetResponse<T> {
    fn new(data: Vec<T>) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/segments", get(segments))
        .route("/supply-chain", get(supply_chain))
        .route("/alerts", get(alerts))
        .route("/sources", get(sources))
}

async fn segments() -> Json<DatasetResponse<Segment>> {
    DatasetResponse::new(catalog::segments())
}

async fn supply_chain() -> Json<DatasetResponse<SupplyComponent>> {
    DatasetResponse::new(catalog::supply_chain())
}

async fn alerts() -> Json<DatasetResponse<Alert>> {
    DatasetResponse::new(catalog::alerts())
}

async fn sources() -> Json<DatasetResponse<DataSourceNote>> {
    DatasetResponse::new(catalog::data_sources())
}
