//! Authenticated JSON-over-HTTP helper shared by the Sheets and Docs backends.

use serde::{Serialize, de::DeserializeOwned};
use sheetpilot_core::BackendError;

/// OAuth credentials for the Google APIs.
#[derive(Clone)]
pub struct GoogleAuth {
    pub access_token: String,
    /// Quota project sent as `x-goog-user-project`.
    pub project_id: Option<String>,
}

impl std::fmt::Debug for GoogleAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleAuth")
            .field("access_token", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct GoogleClient {
    http: reqwest::Client,
    base_url: String,
    auth: GoogleAuth,
}

impl GoogleClient {
    pub(crate) fn new(
        http: reqwest::Client,
        endpoint: &str,
        auth: GoogleAuth,
    ) -> Result<Self, BackendError> {
        if auth.access_token.trim().is_empty() {
            return Err(BackendError::Status {
                status: 401,
                message: "access token must not be empty".to_string(),
            });
        }

        Ok(Self {
            http,
            base_url: normalize_base_url(endpoint)?,
            auth,
        })
    }

    pub(crate) fn url_with_segments(&self, segments: &[&str]) -> Result<reqwest::Url, BackendError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| BackendError::Transport(format!("invalid endpoint: {e}")))?;
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                BackendError::Transport("endpoint must be an absolute URL".to_string())
            })?;
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: reqwest::Url,
        query: &[(&str, &str)],
    ) -> Result<T, BackendError> {
        let request = self.http.get(url).query(query);
        self.send(request).await
    }

    pub(crate) async fn put_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        url: reqwest::Url,
        body: &TReq,
        query: &[(&str, &str)],
    ) -> Result<TRes, BackendError> {
        let request = self.http.put(url).query(query).json(body);
        self.send(request).await
    }

    pub(crate) async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        url: reqwest::Url,
        body: &TReq,
        query: &[(&str, &str)],
    ) -> Result<TRes, BackendError> {
        let request = self.http.post(url).query(query).json(body);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let mut request = request
            .bearer_auth(&self.auth.access_token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(project) = &self.auth.project_id {
            request = request.header("x-goog-user-project", project);
        }

        let response = request.send().await.map_err(transport)?;
        handle_response(response).await
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

fn transport(error: reqwest::Error) -> BackendError {
    BackendError::Transport(error.to_string())
}

pub(crate) fn normalize_base_url(endpoint: &str) -> Result<String, BackendError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(BackendError::Transport("endpoint must not be empty".to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
