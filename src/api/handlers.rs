use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::sensor::{EntityRegistry, SensorSnapshot};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub sensors: usize,
}

pub async fn get_status(State(registry): State<Arc<EntityRegistry>>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        sensors: registry.len(),
    })
}

pub async fn list_sensors(
    State(registry): State<Arc<EntityRegistry>>,
) -> Json<Vec<SensorSnapshot>> {
    Json(registry.all())
}

pub async fn get_sensor(
    State(registry): State<Arc<EntityRegistry>>,
    Path(unique_id): Path<String>,
) -> Result<Json<SensorSnapshot>, StatusCode> {
    registry
        .get(&unique_id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
