//! HTTP access to the listing backend.

use crate::geocode::{GeocodeError, GeocodeResult, Geocoder};
use crate::property::{Property, SheetType};
use futures::future::LocalBoxFuture;
use gloo_net::http::Request;
use serde::Deserialize;
use std::fmt;

#[derive(Debug)]
pub enum FetchError {
    Transport(String),
    HttpStatus(u16),
    Decode(String),
    /// The endpoint answered with JSON that is not an array of properties.
    NotAnArray,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "Failed to reach the server: {}", msg),
            FetchError::HttpStatus(code) => write!(f, "Server answered with status {}", code),
            FetchError::Decode(msg) => write!(f, "Could not read the listing data: {}", msg),
            FetchError::NotAnArray => write!(f, "Listing response is not a list"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Where property listings come from.
pub trait PropertySource {
    fn fetch<'a>(&'a self, sheet: SheetType) -> LocalBoxFuture<'a, Result<Vec<Property>, FetchError>>;
}

/// Decode a `/properties` response body.
pub fn parse_properties(body: &str) -> Result<Vec<Property>, FetchError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    if !value.is_array() {
        return Err(FetchError::NotAnArray);
    }
    serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    result: Option<GeocodeResult>,
}

/// Decode a `/geocode` response body. Only `"OK"` with a result is a hit.
pub fn parse_geocode(body: &str) -> Result<GeocodeResult, GeocodeError> {
    let response: GeocodeResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Decode(e.to_string()))?;
    match (response.status.as_str(), response.result) {
        ("OK", Some(result)) => Ok(result),
        (status, _) => Err(GeocodeError::NotFound(status.to_string())),
    }
}

/// Backend client over `fetch`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: String,
}

impl HttpBackend {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub async fn fetch_properties(&self, sheet: SheetType) -> Result<Vec<Property>, FetchError> {
        let url = format!("{}/properties/{}", self.base, sheet.label());
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if !response.ok() {
            return Err(FetchError::HttpStatus(response.status()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        parse_properties(&body)
    }

    pub async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        let url = format!("{}/geocode", self.base);
        let response = Request::get(&url)
            .query([("address", address)])
            .send()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;
        // A miss comes back as 404 with a JSON status body; read it either way.
        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;
        parse_geocode(&body)
    }
}

impl PropertySource for HttpBackend {
    fn fetch<'a>(&'a self, sheet: SheetType) -> LocalBoxFuture<'a, Result<Vec<Property>, FetchError>> {
        Box::pin(self.fetch_properties(sheet))
    }
}

impl Geocoder for HttpBackend {
    fn lookup<'a>(&'a self, address: &'a str)
        -> LocalBoxFuture<'a, Result<GeocodeResult, GeocodeError>> {
        Box::pin(self.geocode(address))
    }
}
