use crate::config::ArbiterConfig;
use crate::error::{ArbiterError, Result};
use crate::filter::{ChecksheetCriteria, ProjectCriteria, PunchlistCriteria};
use crate::models::{
    Checksheet, DashboardStats, FilterOptions, Project, PunchStatus, Punchlist, RecordPage,
    SoftData, Task, TaskResponsePayload, Template,
};
use crate::source::DataSource;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, USER_AGENT};
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Clone)]
pub struct ArbiterClient {
    http: HttpClient,
    config: ArbiterConfig,
}

impl ArbiterClient {
    pub fn new(config: ArbiterConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send_with_body(Method::GET, path, Option::<&Value>::None)
            .await
    }

    pub async fn get_with_query<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!(path, params = query.len(), "GET with query");
        let response = self
            .http
            .get(self.url_for(path))
            .query(query)
            .send()
            .await?;
        Self::parse_json(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_body(Method::POST, path, Some(body)).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_body(Method::PATCH, path, Some(body)).await
    }

    async fn send_with_body<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%method, path, "request");
        let url = self.url_for(path);
        let mut request = self.http.request(method, url);
        if let Some(payload) = body {
            request = request.json(payload);
        }
        let response = request.send().await?;
        Self::parse_json(response).await
    }

    fn url_for(&self, path: &str) -> String {
        let mut base = self.config.api_root();
        let trimmed = path.trim_start_matches('/');
        base.push_str(trimmed);
        base
    }

    async fn parse_json<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(ArbiterError::from)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            Err(ArbiterError::Authentication(format!(
                "Access denied ({}) - {}",
                status,
                extract_error_message(&body).unwrap_or(body.clone())
            )))
        } else if status == StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            Err(ArbiterError::NotFound(
                extract_error_message(&body).unwrap_or_else(|| "record not found".to_string()),
            ))
        } else if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            Err(ArbiterError::Validation(
                extract_error_message(&body).unwrap_or(body),
            ))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(build_http_error(status, &body))
        }
    }
}

#[async_trait]
impl DataSource for ArbiterClient {
    async fn fetch_checksheet(&self, id: i64) -> Result<Checksheet> {
        self.get(&format!("checksheets/{id}")).await
    }

    async fn fetch_tasks(&self, checksheet_id: i64) -> Result<Vec<Task>> {
        self.get(&format!("checksheets/{checksheet_id}/tasks")).await
    }

    async fn fetch_responses(&self, checksheet_id: i64) -> Result<Vec<SoftData>> {
        self.get(&format!("checksheets/{checksheet_id}/responses"))
            .await
    }

    async fn save_task_response(
        &self,
        checksheet_id: i64,
        payload: &TaskResponsePayload,
    ) -> Result<SoftData> {
        self.post(&format!("checksheets/{checksheet_id}/responses"), payload)
            .await
    }

    async fn mark_checksheet_complete(
        &self,
        checksheet_id: i64,
        actor_id: i64,
    ) -> Result<Checksheet> {
        let payload = CompleteRequest { user_id: actor_id };
        self.post(&format!("checksheets/{checksheet_id}/complete"), &payload)
            .await
    }

    async fn fetch_checksheets(
        &self,
        page: u32,
        criteria: &ChecksheetCriteria,
    ) -> Result<RecordPage<Checksheet>> {
        self.get_with_query("checksheets", &criteria.to_query(page))
            .await
    }

    async fn fetch_punchlists(
        &self,
        page: u32,
        criteria: &PunchlistCriteria,
    ) -> Result<RecordPage<Punchlist>> {
        self.get_with_query("punchlists", &criteria.to_query(page))
            .await
    }

    async fn fetch_projects(
        &self,
        page: u32,
        criteria: &ProjectCriteria,
    ) -> Result<RecordPage<Project>> {
        self.get_with_query("projects", &criteria.to_query(page))
            .await
    }

    async fn fetch_punchlist(&self, id: i64) -> Result<Punchlist> {
        self.get(&format!("punchlists/{id}")).await
    }

    async fn fetch_project(&self, id: i64) -> Result<Project> {
        self.get(&format!("projects/{id}")).await
    }

    async fn fetch_templates(&self) -> Result<Vec<Template>> {
        self.get("templates").await
    }

    async fn update_punchlist_status(
        &self,
        id: i64,
        status: PunchStatus,
        actor_id: i64,
    ) -> Result<Punchlist> {
        let payload = PunchStatusUpdateRequest {
            status: status.as_str(),
            user_id: actor_id,
        };
        self.patch(&format!("punchlists/{id}/status"), &payload)
            .await
    }

    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats> {
        self.get("dashboard/stats").await
    }

    async fn fetch_filter_options(&self) -> Result<FilterOptions> {
        self.get("filters/options").await
    }
}

fn build_http_client(config: &ArbiterConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    headers.insert(
        AUTHORIZATION,
        header_value(format!("Bearer {}", config.token))?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, header_value(config.user_agent.clone())?);

    if let Some(language) = &config.accept_language {
        headers.insert(ACCEPT_LANGUAGE, header_value(language.clone())?);
    }

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| ArbiterError::Other(err.to_string()))
}

fn header_value(value: String) -> Result<HeaderValue> {
    HeaderValue::from_str(&value).map_err(|err| ArbiterError::Other(err.to_string()))
}

fn build_http_error(status: StatusCode, body: &str) -> ArbiterError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    ArbiterError::http(status, extract_error_code(body), message)
}

fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
}

fn extract_error_code(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("code")
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
    })
}

#[derive(Debug, Serialize)]
struct CompleteRequest {
    user_id: i64,
}

#[derive(Debug, Serialize)]
struct PunchStatusUpdateRequest<'a> {
    status: &'a str,
    user_id: i64,
}
