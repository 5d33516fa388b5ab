// SPDX-License-Identifier: Apache-2.0
use axum::{
    body::Bytes,
    extract::Multipart,
    handler::Handler,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use csrview_csr::ParsedCsr;
use log::{debug, error, info};
use serde::Serialize;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::{res, PRODUCT_NAME};

/// Error body returned for rejected uploads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub exception_error_code: String,
}

#[derive(Debug)]
pub enum ApiError {
    MissingPart,
    EmptyFile,
    BadMultipart,
    InvalidCsr,
}

impl ApiError {
    fn message(&self) -> &'static str {
        match self {
            ApiError::MissingPart => "Required file part 'csr' is not present",
            ApiError::EmptyFile => "The provided file is empty",
            ApiError::BadMultipart => "The upload could not be read",
            ApiError::InvalidCsr => "Input is not a valid PKCS#10 CSR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::BAD_REQUEST;
        (
            status,
            Json(ErrorBody {
                message: self.message().to_string(),
                exception_error_code: status.to_string(),
            }),
        )
            .into_response()
    }
}

async fn get_root() -> impl IntoResponse {
    (
        StatusCode::OK,
        res::html_headers(),
        format!(
            include_str!("tmpl/base.html"),
            title = PRODUCT_NAME,
            product_name = PRODUCT_NAME,
            heading = "Inspect a certificate signing request",
            content = include_str!("tmpl/upload.html"),
            css = include_str!("tmpl/base.css"),
            script = include_str!("tmpl/upload.js"),
        ),
    )
}

async fn parse_csr(mut multipart: Multipart) -> Result<(StatusCode, Json<ParsedCsr>), ApiError> {
    let mut file: Option<(String, Bytes)> = None;
    loop {
        let field = multipart.next_field().await.map_err(|err| {
            debug!("unreadable multipart body: {}", err);
            ApiError::BadMultipart
        })?;
        let field = match field {
            Some(field) => field,
            None => break,
        };
        if field.name() != Some("csr") {
            continue;
        }
        let name = field.file_name().unwrap_or("<unnamed>").to_string();
        let data = field.bytes().await.map_err(|err| {
            debug!("unreadable file part: {}", err);
            ApiError::BadMultipart
        })?;
        file = Some((name, data));
        break;
    }
    let (name, data) = file.ok_or(ApiError::MissingPart)?;
    info!(
        "received parse request for file {:?}, size {} bytes",
        name,
        data.len()
    );
    if data.is_empty() {
        error!("received empty file");
        return Err(ApiError::EmptyFile);
    }
    match csrview_csr::parse_pem(&data) {
        Ok(parsed) => {
            info!(
                "parsed request, {} subject entries, algorithm {:?}",
                parsed.subject.len(),
                parsed.public_key_algorithm
            );
            Ok((StatusCode::OK, Json(parsed)))
        }
        Err(err) => {
            error!("invalid request file {:?}: {:?}", name, err);
            Err(ApiError::InvalidCsr)
        }
    }
}

async fn global_404() -> impl IntoResponse {
    res::not_found("Page")
}

async fn log_middleware<B>(req: Request<B>, next: Next<B>) -> Response {
    debug!(
        "{:?} {:?} {:?}",
        req.method(),
        req.uri(),
        req.headers()
            .get(header::USER_AGENT)
            .map(Clone::clone)
            .unwrap_or_else(|| HeaderValue::from_static("-")),
    );
    next.run(req).await
}

pub fn app() -> Router {
    Router::new()
        .route("/", get(get_root))
        .route("/api/parse-csr", post(parse_csr))
        .fallback(global_404.into_service())
        .layer(middleware::from_fn(log_middleware))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::SERVER,
            HeaderValue::from_static("csrview/0.1"),
        ))
}
