use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const TASKS_TABLE: &str = "todos";
const CATEGORIES_TABLE: &str = "categories";

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("api response contained no rows")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorClass {
    Auth,
    RateLimit,
    Transient,
    Permanent,
}

#[derive(Clone)]
pub struct BoardClient {
    http: Client,
    base_url: Url,
    api_key: String,
    access_token: String,
}

impl BoardClient {
    pub fn with_base_url(
        base_url: &str,
        api_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, BoardError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            api_key: api_key.into(),
            access_token: access_token.into(),
        })
    }

    pub async fn list_tasks(&self) -> Result<Vec<TaskRow>, BoardError> {
        let mut url = self.table_endpoint(TASKS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        let response = self.request(Method::GET, url).send().await?;
        Self::handle_response(response).await
    }

    pub async fn insert_task(&self, fields: &TaskFields) -> Result<TaskRow, BoardError> {
        let url = self.table_endpoint(TASKS_TABLE)?;
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(std::slice::from_ref(fields))
            .send()
            .await?;
        let rows: Vec<TaskRow> = Self::handle_response(response).await?;
        rows.into_iter().next().ok_or(BoardError::EmptyResponse)
    }

    pub async fn update_task(&self, id: &str, fields: &TaskFields) -> Result<TaskRow, BoardError> {
        let mut url = self.table_endpoint(TASKS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"));
        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(fields)
            .send()
            .await?;
        let rows: Vec<TaskRow> = Self::handle_response(response).await?;
        rows.into_iter().next().ok_or(BoardError::EmptyResponse)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), BoardError> {
        let mut url = self.table_endpoint(TASKS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"));
        let response = self.request(Method::DELETE, url).send().await?;
        Self::handle_empty(response).await
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryRow>, BoardError> {
        let mut url = self.table_endpoint(CATEGORIES_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "name.asc");
        let response = self.request(Method::GET, url).send().await?;
        Self::handle_response(response).await
    }

    pub async fn insert_categories(
        &self,
        fields: &[CategoryFields],
    ) -> Result<Vec<CategoryRow>, BoardError> {
        let url = self.table_endpoint(CATEGORIES_TABLE)?;
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(fields)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), BoardError> {
        let mut url = self.table_endpoint(CATEGORIES_TABLE)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"));
        let response = self.request(Method::DELETE, url).send().await?;
        Self::handle_empty(response).await
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", self.auth_header_value())
    }

    fn auth_header_value(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn table_endpoint(&self, table: &str) -> Result<Url, BoardError> {
        Ok(self.base_url.join(&format!("/rest/v1/{table}"))?)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BoardError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(BoardError::Api { status, body })
        }
    }

    async fn handle_empty(response: reqwest::Response) -> Result<(), BoardError> {
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(BoardError::Api { status, body })
    }
}

impl BoardError {
    pub fn classification(&self) -> Option<ApiErrorClass> {
        match self {
            BoardError::Api { status, .. } => Some(classify_api_status(*status)),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.classification(),
            Some(ApiErrorClass::RateLimit | ApiErrorClass::Transient)
        )
    }

    /// True when the server rejected a payload because a column does not
    /// exist in its schema (PostgREST reports this as a 400/404 whose body
    /// names the missing column).
    pub fn is_unknown_column(&self, column: &str) -> bool {
        match self {
            BoardError::Api { status, body } => {
                matches!(*status, StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND)
                    && body.contains("column")
                    && body.contains(&format!("'{column}'"))
            }
            _ => false,
        }
    }
}

fn classify_api_status(status: StatusCode) -> ApiErrorClass {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        ApiErrorClass::Auth
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ApiErrorClass::RateLimit
    } else if status.is_server_error()
        || matches!(
            status,
            StatusCode::REQUEST_TIMEOUT | StatusCode::CONFLICT | StatusCode::TOO_EARLY
        )
    {
        ApiErrorClass::Transient
    } else {
        ApiErrorClass::Permanent
    }
}

/// A task row as the remote store returns it. Every column except the
/// identifier may be absent depending on the deployed schema.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskRow {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub is_complete: Option<bool>,
    #[serde(default)]
    pub archived_at: Option<String>,
    #[serde(default)]
    pub activated_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    // jsonb column; deployments have been seen storing non-string entries.
    #[serde(default)]
    pub categories: Option<Vec<serde_json::Value>>,
}

/// Write-side shape for inserts and partial updates. An outer `None` omits
/// the column entirely; `Some(None)` on a nullable column writes SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CategoryRow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}
