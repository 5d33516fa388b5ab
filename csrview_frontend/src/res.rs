// SPDX-License-Identifier: Apache-2.0
use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

pub fn html_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
    headers
}

pub fn not_found(thing: &'static str) -> Response {
    (StatusCode::NOT_FOUND, format!("{} not found.", thing)).into_response()
}
