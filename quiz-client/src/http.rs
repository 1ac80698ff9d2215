//! HTTP client for the quiz server REST API

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    ClientAck, CreateQuestionRequest, ErrorBody, HealthResponse, Question, QuestionContent,
    QuestionList, ReconcileQuery, ReconcileResponse,
};

use crate::{ClientConfig, ClientError, ClientResult};

/// HTTP client for making requests to the quiz server
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    client_id: String,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            // Prefer the structured message when the body carries one
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            return Err(ClientError::Server { status, message });
        }

        response.json().await.map_err(Into::into)
    }

    // ========== Quiz API ==========

    /// GET / - server health
    pub async fn health(&self) -> ClientResult<HealthResponse> {
        self.get("/").await
    }

    /// GET /reconcile - unacknowledged backlog after `last_seq`
    pub async fn reconcile(&self, last_seq: u64) -> ClientResult<ReconcileResponse> {
        let query = ReconcileQuery::new(self.client_id.clone(), last_seq);
        let response = self
            .client
            .get(self.url("/reconcile"))
            .query(&query)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// POST /questions - create a question
    pub async fn create_question(&self, content: QuestionContent) -> ClientResult<Question> {
        self.post("/questions", &CreateQuestionRequest::from(content))
            .await
    }

    /// GET /questions - all questions, ascending by seq
    pub async fn list_questions(&self) -> ClientResult<Vec<Question>> {
        Ok(self.get::<QuestionList>("/questions").await?.questions)
    }

    /// GET /questions/{seq}
    pub async fn get_question(&self, seq: u64) -> ClientResult<Question> {
        self.get(&format!("/questions/{}", seq)).await
    }

    /// GET /clients/{clientId}/ack - this client's ack record, if any
    pub async fn ack_record(&self) -> ClientResult<Option<ClientAck>> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["clients", self.client_id.as_str(), "ack"]);

        let response = self.client.get(url).send().await?;
        match Self::handle_response(response).await {
            Ok(record) => Ok(Some(record)),
            Err(ClientError::Server { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }
}
