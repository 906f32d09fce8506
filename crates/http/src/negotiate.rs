//! JSON / XML content negotiation for request and response bodies.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        request::Parts,
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppError;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Wire format of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFormat {
    #[default]
    Json,
    Xml,
}

impl MediaFormat {
    /// Classify a concrete media type, ignoring parameters.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/json" => Some(MediaFormat::Json),
            "application/xml" | "text/xml" => Some(MediaFormat::Xml),
            other if other.ends_with("+json") => Some(MediaFormat::Json),
            other if other.ends_with("+xml") => Some(MediaFormat::Xml),
            _ => None,
        }
    }

    /// Pick the response format from an `Accept` header value.
    ///
    /// Highest `q` wins, the earlier range wins ties, JSON is the fallback.
    pub fn from_accept(accept: Option<&str>) -> Self {
        let Some(accept) = accept else {
            return MediaFormat::Json;
        };

        let mut best: Option<(f32, MediaFormat)> = None;
        for range in accept.split(',') {
            let mut params = range.split(';');
            let media = params.next().unwrap_or_default().trim();
            let quality = params
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            let format = match media {
                "*/*" | "application/*" => MediaFormat::Json,
                other => match Self::from_media_type(other) {
                    Some(format) => format,
                    None => continue,
                },
            };

            if quality > 0.0 && best.map_or(true, |(q, _)| quality > q) {
                best = Some((quality, format));
            }
        }

        best.map(|(_, format)| format).unwrap_or_default()
    }

    pub fn content_type(self) -> &'static str {
        match self {
            MediaFormat::Json => JSON_CONTENT_TYPE,
            MediaFormat::Xml => XML_CONTENT_TYPE,
        }
    }
}

impl<S> FromRequestParts<S> for MediaFormat
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = parts.headers.get(ACCEPT).and_then(|v| v.to_str().ok());
        Ok(MediaFormat::from_accept(accept))
    }
}

/// Response body rendered in the format the client asked for.
#[derive(Debug)]
pub struct Negotiated<T> {
    format: MediaFormat,
    status: StatusCode,
    body: T,
}

impl<T> Negotiated<T> {
    pub fn new(format: MediaFormat, status: StatusCode, body: T) -> Self {
        Self {
            format,
            status,
            body,
        }
    }

    pub fn ok(format: MediaFormat, body: T) -> Self {
        Self::new(format, StatusCode::OK, body)
    }
}

impl<T: Serialize> IntoResponse for Negotiated<T> {
    fn into_response(self) -> Response {
        match self.format {
            MediaFormat::Json => (self.status, Json(self.body)).into_response(),
            MediaFormat::Xml => match quick_xml::se::to_string(&self.body) {
                Ok(xml) => (
                    self.status,
                    [(CONTENT_TYPE, HeaderValue::from_static(self.format.content_type()))],
                    xml,
                )
                    .into_response(),
                Err(err) => AppError::Internal(
                    anyhow::Error::new(err).context("failed to serialize XML response"),
                )
                .into_response(),
            },
        }
    }
}

/// Request body accepted as JSON or XML depending on `Content-Type`.
#[derive(Debug)]
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        match content_type.as_deref().and_then(MediaFormat::from_media_type) {
            Some(MediaFormat::Json) => Json::<T>::from_request(req, state)
                .await
                .map(|Json(value)| Payload(value))
                .map_err(from_json_rejection),
            Some(MediaFormat::Xml) => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| AppError::bad_request(format!("XML body is not UTF-8: {e}")))?;
                quick_xml::de::from_str(text)
                    .map(Payload)
                    .map_err(|e| AppError::bad_request(format!("invalid XML body: {e}")))
            }
            None => Err(AppError::unsupported_media_type(format!(
                "expected {} or {}, got {}",
                JSON_CONTENT_TYPE,
                XML_CONTENT_TYPE,
                content_type.as_deref().unwrap_or("no content type")
            ))),
        }
    }
}

fn from_json_rejection(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::UNSUPPORTED_MEDIA_TYPE {
        AppError::unsupported_media_type(rejection.body_text())
    } else {
        AppError::bad_request(rejection.body_text())
    }
}
