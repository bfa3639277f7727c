//! Route requests against the remote route service.
//!
//! The service owns the pathfinding; this side only builds the query and
//! normalizes the response into a [`RouteResult`]. A failed request never
//! produces a partial result, so whoever holds the previous route keeps it.

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::api::{LocationSample, NextClass, RouteEdge, RouteNode, RouteResult};
use crate::error::RouteError;

/// Query parameters for `GET /getShortestPath`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(rename = "classBuildingName")]
    pub class_building_name: String,
}

impl RouteQuery {
    pub fn new(sample: &LocationSample, building: &str, uid: Option<&str>) -> Self {
        Self {
            uid: uid.map(str::to_string),
            latitude: sample.latitude,
            longitude: sample.longitude,
            altitude: sample.altitude,
            class_building_name: building.to_string(),
        }
    }
}

/// Remote shortest-path service.
///
/// Returns the raw JSON body; normalization happens in [`normalize_route`].
#[async_trait]
pub trait RouteService: Send + Sync {
    async fn shortest_path(&self, query: &RouteQuery) -> Result<Value, RouteError>;
}

/// Turn a route service response body into a [`RouteResult`].
///
/// Requires `nodes` and `edges` arrays and non-negative numeric `totalTime`
/// and `totalLength`, which are rounded up to whole units.
pub fn normalize_route(body: &Value) -> Result<RouteResult, RouteError> {
    let nodes = array_field(body, "nodes")?
        .iter()
        .cloned()
        .map(RouteNode)
        .collect();
    let edges = array_field(body, "edges")?
        .iter()
        .cloned()
        .map(RouteEdge)
        .collect();

    Ok(RouteResult {
        nodes,
        edges,
        minutes_needed: ceil_field(body, "totalTime")?,
        distance_meters: ceil_field(body, "totalLength")?,
    })
}

fn array_field<'a>(body: &'a Value, field: &str) -> Result<&'a Vec<Value>, RouteError> {
    match body.get(field) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(RouteError::malformed(
            field,
            format!("expected an array, found {}", json_kind(other)),
        )),
        None => Err(RouteError::malformed(field, "missing")),
    }
}

fn ceil_field(body: &Value, field: &str) -> Result<u32, RouteError> {
    let value = body
        .get(field)
        .ok_or_else(|| RouteError::malformed(field, "missing"))?;
    let number = value.as_f64().ok_or_else(|| {
        RouteError::malformed(field, format!("expected a number, found {}", json_kind(value)))
    })?;
    if !number.is_finite() || number < 0.0 || number.ceil() > f64::from(u32::MAX) {
        return Err(RouteError::malformed(
            field,
            format!("out of range: {}", number),
        ));
    }
    Ok(number.ceil() as u32)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds route queries for the resolved next class.
#[derive(Clone)]
pub struct RouteCoordinator {
    service: Arc<dyn RouteService>,
}

impl RouteCoordinator {
    pub fn new(service: Arc<dyn RouteService>) -> Self {
        Self { service }
    }

    /// Request a route to `next`.
    ///
    /// # Returns
    /// * `Ok(None)` - `next` is the no-classes sentinel; no request is made
    /// * `Ok(Some(RouteResult))` - normalized route
    /// * `Err(RouteError)` - transport, status or malformed response
    pub async fn request_route(
        &self,
        next: &NextClass,
        sample: &LocationSample,
        uid: Option<&str>,
    ) -> Result<Option<RouteResult>, RouteError> {
        let NextClass::Class(entry) = next else {
            return Ok(None);
        };

        let query = RouteQuery::new(sample, entry.building_name(), uid);
        debug!(
            "Requesting route to '{}' for {}",
            query.class_building_name, entry.course_number
        );

        let result = self
            .service
            .shortest_path(&query)
            .await
            .and_then(|body| normalize_route(&body));

        match result {
            Ok(route) => Ok(Some(route)),
            Err(e) => {
                warn!("Error fetching navigation data: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(feature = "http-route")]
pub use http::HttpRouteService;

#[cfg(feature = "http-route")]
mod http {
    use super::*;
    use crate::config::RouteServiceSettings;

    const SHORTEST_PATH: &str = "getShortestPath";

    /// reqwest client for the route service.
    #[derive(Clone)]
    pub struct HttpRouteService {
        client: reqwest::Client,
        endpoint: String,
    }

    impl HttpRouteService {
        pub fn new(settings: &RouteServiceSettings) -> Result<Self, RouteError> {
            let client = reqwest::Client::builder()
                .timeout(settings.timeout())
                .build()
                .map_err(|e| RouteError::Transport(format!("Failed to build HTTP client: {}", e)))?;
            Ok(Self {
                client,
                endpoint: endpoint_url(&settings.base_url),
            })
        }

        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }
    }

    pub(super) fn endpoint_url(base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), SHORTEST_PATH)
    }

    #[async_trait]
    impl RouteService for HttpRouteService {
        async fn shortest_path(&self, query: &RouteQuery) -> Result<Value, RouteError> {
            let response = self
                .client
                .get(&self.endpoint)
                .query(query)
                .send()
                .await
                .map_err(|e| RouteError::Transport(e.to_string()))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| RouteError::Transport(format!("Failed to read body: {}", e)))?;

            if !status.is_success() {
                return Err(RouteError::Status {
                    status: status.as_u16(),
                    body: body.trim().to_string(),
                });
            }

            serde_json::from_str(&body)
                .map_err(|e| RouteError::malformed("body", format!("invalid JSON: {}", e)))
        }
    }

}
