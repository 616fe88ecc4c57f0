//! Request parameter extractors
//!
//! [`FormValues`] collects fields from an urlencoded or multipart body
//! followed by the URL query string; [`QueryValues`] reads the query string
//! only. Lookups return the first value of a repeated field. A body that
//! cannot be read or decoded rejects the request, so handlers never see a
//! half-parsed request as "no parameters".

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::BytesRejection,
        FromRequest, FromRequestParts, Multipart, Request,
    },
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};

const URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

/// Ordered name/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pairs: Vec<(String, String)>,
}

impl FormValues {
    /// First value of `name`, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value of `name`, or `""` when absent
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    fn parse(raw: &[u8]) -> Result<Self, ParamsRejection> {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(raw)
            .map_err(|e| ParamsRejection::Malformed(e.to_string()))?;
        Ok(Self { pairs })
    }

    fn from_query(parts: &Parts) -> Result<Self, ParamsRejection> {
        Self::parse(parts.uri.query().unwrap_or_default().as_bytes())
    }
}

/// Query string parameters
#[derive(Debug, Clone, Default)]
pub struct QueryValues(pub FormValues);

#[derive(Debug)]
pub enum ParamsRejection {
    Body(BytesRejection),
    Multipart(MultipartRejection),
    MultipartField(MultipartError),
    Malformed(String),
    UnsupportedMediaType(String),
}

impl IntoResponse for ParamsRejection {
    fn into_response(self) -> Response {
        match self {
            ParamsRejection::Body(rejection) => rejection.into_response(),
            ParamsRejection::Multipart(rejection) => rejection.into_response(),
            ParamsRejection::MultipartField(e) => {
                (StatusCode::BAD_REQUEST, format!("Invalid multipart field: {}", e)).into_response()
            }
            ParamsRejection::Malformed(msg) => {
                (StatusCode::BAD_REQUEST, format!("Malformed form data: {}", msg)).into_response()
            }
            ParamsRejection::UnsupportedMediaType(content_type) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Unsupported content type: {}", content_type),
            )
                .into_response(),
        }
    }
}

/// Media type without parameters, lowercased
fn media_type(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for QueryValues
where
    S: Send + Sync,
{
    type Rejection = ParamsRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(FormValues::from_query(parts)?))
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormValues
where
    S: Send + Sync,
{
    type Rejection = ParamsRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let query = FormValues::from_query(&parts)?;
        let content_type = media_type(&parts);
        let req = Request::from_parts(parts, body);

        let mut values = match content_type.as_deref() {
            Some(URLENCODED) => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(ParamsRejection::Body)?;
                FormValues::parse(&bytes)?
            }
            Some(MULTIPART) => {
                let mut multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(ParamsRejection::Multipart)?;
                let mut pairs = Vec::new();
                while let Some(field) = multipart
                    .next_field()
                    .await
                    .map_err(ParamsRejection::MultipartField)?
                {
                    let Some(name) = field.name().map(str::to_string) else {
                        continue;
                    };
                    if field.file_name().is_some() {
                        continue;
                    }
                    let text = field.text().await.map_err(ParamsRejection::MultipartField)?;
                    pairs.push((name, text));
                }
                FormValues { pairs }
            }
            other => {
                // only an empty body may come without a form content type
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(ParamsRejection::Body)?;
                if !bytes.is_empty() {
                    return Err(ParamsRejection::UnsupportedMediaType(
                        other.unwrap_or("none").to_string(),
                    ));
                }
                FormValues::default()
            }
        };

        values.pairs.extend(query.pairs);
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str, content_type: Option<&str>, body: &str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_first_value_wins() {
        let req = request("/set", Some(URLENCODED), "key=a&key=b&val=x");
        let values = FormValues::from_request(req, &()).await.unwrap();
        assert_eq!(values.get("key"), Some("a"));
        assert_eq!(values.value("val"), "x");
        assert_eq!(values.get("missing"), None);
        assert_eq!(values.value("missing"), "");
    }

    #[tokio::test]
    async fn test_body_before_query() {
        let req = request("/set?key=q&val=fromquery", Some(URLENCODED), "key=b");
        let values = FormValues::from_request(req, &()).await.unwrap();
        assert_eq!(values.value("key"), "b");
        assert_eq!(values.value("val"), "fromquery");
    }

    #[tokio::test]
    async fn test_content_type_parameters_ignored() {
        let req = request(
            "/set",
            Some("Application/X-WWW-Form-Urlencoded; charset=UTF-8"),
            "key=a",
        );
        let values = FormValues::from_request(req, &()).await.unwrap();
        assert_eq!(values.value("key"), "a");
    }

    #[tokio::test]
    async fn test_multipart_fields() {
        let body = "--XB\r\n\
                    Content-Disposition: form-data; name=\"key\"\r\n\r\n\
                    a\r\n\
                    --XB\r\n\
                    Content-Disposition: form-data; name=\"upload\"; filename=\"f.txt\"\r\n\r\n\
                    ignored\r\n\
                    --XB\r\n\
                    Content-Disposition: form-data; name=\"val\"\r\n\r\n\
                    hello\r\n\
                    --XB--\r\n";
        let req = request("/set", Some("multipart/form-data; boundary=XB"), body);
        let values = FormValues::from_request(req, &()).await.unwrap();
        assert_eq!(values.value("key"), "a");
        assert_eq!(values.value("val"), "hello");
        assert_eq!(values.get("upload"), None);
    }

    #[tokio::test]
    async fn test_empty_body_without_content_type_uses_query() {
        let req = request("/set?key=a&val=q", None, "");
        let values = FormValues::from_request(req, &()).await.unwrap();
        assert_eq!(values.value("key"), "a");
        assert_eq!(values.value("val"), "q");
    }

    #[tokio::test]
    async fn test_unsupported_body_rejected() {
        let req = request("/set", Some("application/json"), r#"{"key":"a"}"#);
        let err = FormValues::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let req = request("/set", None, "key=a");
        let err = FormValues::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_broken_multipart_rejected() {
        let req = request("/set", Some("multipart/form-data"), "--XB\r\n");
        let err = FormValues::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_query_values() {
        let req = axum::http::Request::builder()
            .uri("/get?key=a&key=b")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let QueryValues(values) = QueryValues::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(values.value("key"), "a");
    }
}
