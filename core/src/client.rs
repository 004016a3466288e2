//! Stateless request builder and envelope parser for one resource kind.
//!
//! # Design
//! `ResourceClient<R>` holds only a `base_url`. Each operation is split into a
//! `build_*` method producing an `HttpRequest` and a `parse_*` method
//! consuming the matching `HttpResponse`. Responses use the
//! `{success, data, error}` envelope; a `success: false` body is an
//! application error even when the status is non-2xx.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::resource::Resource;
use crate::types::{Envelope, Habit, Todo};

#[derive(Debug, Clone)]
pub struct ResourceClient<R> {
    base_url: String,
    _kind: PhantomData<fn() -> R>,
}

pub type TodoClient = ResourceClient<Todo>;
pub type HabitClient = ResourceClient<Habit>;

impl<R: Resource> ResourceClient<R> {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            _kind: PhantomData,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, R::PATH)
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/{}/{id}", self.base_url, R::PATH)
    }

    pub fn build_list(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.collection_url(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Validates the draft first; a rejected draft never becomes a request.
    pub fn build_create(&self, draft: &R::Draft) -> Result<HttpRequest, ApiError> {
        R::validate(draft)?;
        let body =
            serde_json::to_string(draft).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.collection_url(),
            headers: json_headers(),
            body: Some(body),
        })
    }

    pub fn build_delete(&self, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.item_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<R>, ApiError> {
        read_data(&response)
    }

    /// Parses any endpoint that answers with a single item in `data`.
    pub fn parse_item(&self, response: HttpResponse) -> Result<R, ApiError> {
        read_data(&response)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        if response.status == 204 && response.body.trim().is_empty() {
            return Ok(());
        }
        read_envelope::<serde_json::Value>(&response).map(|_| ())
    }
}

impl ResourceClient<Todo> {
    pub fn build_toggle(&self, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Patch,
            path: format!("{}/toggle", self.item_url(id)),
            headers: Vec::new(),
            body: None,
        }
    }
}

impl ResourceClient<Habit> {
    pub fn build_check_in(&self, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/checkin", self.item_url(id)),
            headers: Vec::new(),
            body: None,
        }
    }
}

pub(crate) fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

/// Decode the envelope and map `success: false` and bad statuses to errors.
fn read_envelope<T: DeserializeOwned>(response: &HttpResponse) -> Result<Envelope<T>, ApiError> {
    let envelope: Envelope<T> = match serde_json::from_str(&response.body) {
        Ok(envelope) => envelope,
        Err(e) if response.is_success() => return Err(ApiError::Decode(e.to_string())),
        Err(_) => return Err(status_error(response)),
    };
    if !envelope.success {
        return Err(ApiError::Application(envelope.error.unwrap_or_default()));
    }
    if !response.is_success() {
        return Err(status_error(response));
    }
    Ok(envelope)
}

fn read_data<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    read_envelope(response)?
        .data
        .ok_or_else(|| ApiError::Decode("envelope has no data".to_string()))
}

fn status_error(response: &HttpResponse) -> ApiError {
    ApiError::HttpStatus {
        status: response.status,
        body: response.body.clone(),
    }
}
