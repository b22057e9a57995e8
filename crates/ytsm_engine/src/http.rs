use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use url::Url;
use ytsm_core::FileUpload;

use crate::{FailureKind, HttpReply, RequestError};

/// Header Django reads the CSRF token from on AJAX posts.
const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Sent as `Cookie` on every request, e.g. `sessionid=...; csrftoken=...`.
    pub session_cookie: Option<String>,
    pub csrf_token: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_bytes: 2 * 1024 * 1024,
            session_cookie: None,
            csrf_token: None,
        }
    }
}

/// Body of a POST request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormBody {
    Empty,
    UrlEncoded(Vec<(String, String)>),
    Multipart {
        values: Vec<(String, String)>,
        files: Vec<FileUpload>,
    },
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: Url) -> Result<HttpReply, RequestError>;

    async fn post(&self, url: Url, body: FormBody) -> Result<HttpReply, RequestError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    max_bytes: u64,
    csrf_token: Option<String>,
}

impl ReqwestTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self, RequestError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = settings.session_cookie.as_deref() {
            let value = HeaderValue::from_str(cookie)
                .map_err(|err| RequestError::new(FailureKind::InvalidSettings, err.to_string()))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .default_headers(headers)
            .build()
            .map_err(|err| RequestError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            max_bytes: settings.max_bytes,
            csrf_token: settings.csrf_token.clone(),
        })
    }

    async fn read(&self, response: reqwest::Response) -> Result<HttpReply, RequestError> {
        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(too_large(self.max_bytes, content_len));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(too_large(self.max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(HttpReply {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: Url) -> Result<HttpReply, RequestError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.read(response).await
    }

    async fn post(&self, url: Url, body: FormBody) -> Result<HttpReply, RequestError> {
        let mut request = self.client.post(url);
        if let Some(token) = self.csrf_token.as_deref() {
            request = request.header(CSRF_HEADER, token);
        }
        request = match body {
            FormBody::Empty => request,
            FormBody::UrlEncoded(values) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(values)
                    .finish();
                request
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(encoded)
            }
            FormBody::Multipart { values, files } => {
                let form = values
                    .into_iter()
                    .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                        form.text(name, value)
                    });
                let form = files.into_iter().fold(form, |form, file| {
                    let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
                    form.part(file.field, part)
                });
                request.multipart(form)
            }
        };

        let response = request.send().await.map_err(map_reqwest_error)?;
        self.read(response).await
    }
}

fn too_large(max_bytes: u64, actual: u64) -> RequestError {
    RequestError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> RequestError {
    if err.is_timeout() {
        return RequestError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return RequestError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    RequestError::new(FailureKind::Network, err.to_string())
}
