//! Service identity and the Camelot wheel table

use axum::{routing::get, Json, Router};
use muzo_common::harmony::wheel;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
}

/// Both directions of the wheel, keyed for lookup by the UI
#[derive(Debug, Serialize)]
pub struct CamelotWheel {
    pub camelot_to_key: BTreeMap<&'static str, &'static str>,
    pub key_to_camelot: BTreeMap<&'static str, &'static str>,
}

/// GET /api/
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "Muzo Library Manager".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/camelot-wheel
pub async fn camelot_wheel() -> Json<CamelotWheel> {
    let mut camelot_to_key = BTreeMap::new();
    let mut key_to_camelot = BTreeMap::new();
    for (code, key) in wheel() {
        camelot_to_key.insert(code, key);
        key_to_camelot.insert(key, code);
    }

    Json(CamelotWheel {
        camelot_to_key,
        key_to_camelot,
    })
}

pub fn info_routes() -> Router<AppState> {
    Router::new()
        .route("/api/", get(service_info))
        .route("/api/camelot-wheel", get(camelot_wheel))
}
