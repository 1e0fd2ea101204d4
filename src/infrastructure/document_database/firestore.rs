use async_trait::async_trait;
use gcp_auth::TokenProvider;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

use super::firestore_value::{decode_fields, encode_fields};
use crate::domain::{ports::DocumentDatabase, DocumentRef, DomainError, StoredDocument};
use crate::infrastructure::config::FirestoreConfig;

// The emulator accepts this token as an administrator.
const EMULATOR_TOKEN: &str = "owner";

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Supplies the bearer token for each request.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, DomainError>;
}

/// A fixed token, for the emulator or an explicit override.
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, DomainError> {
        Ok(self.0.clone())
    }
}

/// Application Default Credentials. The provider caches tokens and refreshes
/// them before they expire.
pub struct ApplicationDefaultCredentials(Arc<dyn TokenProvider>);

impl ApplicationDefaultCredentials {
    pub async fn discover() -> Result<Self, DomainError> {
        gcp_auth::provider()
            .await
            .map(Self)
            .map_err(|e| DomainError::connection(format!("no Google credentials found: {e}")))
    }
}

#[async_trait]
impl AccessTokenSource for ApplicationDefaultCredentials {
    async fn access_token(&self) -> Result<String, DomainError> {
        let token = self
            .0
            .token(&[DATASTORE_SCOPE])
            .await
            .map_err(|e| DomainError::connection(format!("fetching access token: {e}")))?;
        Ok(token.as_str().to_string())
    }
}

/// Firestore over the REST v1 API.
pub struct FirestoreDatabase {
    client: Client,
    documents_root: Url,
    tokens: Arc<dyn AccessTokenSource>,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl FirestoreDatabase {
    /// Picks credentials in order: emulator, `access_token` override,
    /// Application Default Credentials.
    pub async fn connect(project_id: &str, config: &FirestoreConfig) -> Result<Self, DomainError> {
        let tokens: Arc<dyn AccessTokenSource> = match (&config.emulator_host, &config.access_token)
        {
            (Some(_), _) => Arc::new(StaticToken(EMULATOR_TOKEN.to_string())),
            (None, Some(token)) => Arc::new(StaticToken(token.clone())),
            (None, None) => Arc::new(ApplicationDefaultCredentials::discover().await?),
        };
        Self::with_token_source(project_id, config, tokens)
    }

    pub fn with_token_source(
        project_id: &str,
        config: &FirestoreConfig,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, DomainError> {
        let base_url = match &config.emulator_host {
            Some(host) => format!("http://{host}/v1"),
            None => config.base_url.clone(),
        };

        let mut documents_root =
            Url::parse(&base_url).map_err(|e| DomainError::connection(e.to_string()))?;
        documents_root
            .path_segments_mut()
            .map_err(|_| DomainError::connection(format!("invalid base url {base_url}")))?
            .pop_if_empty()
            .extend(["projects", project_id, "databases", config.database.as_str(), "documents"]);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::connection(e.to_string()))?;

        tracing::debug!(root = %documents_root, "firestore client ready");

        Ok(Self {
            client,
            documents_root,
            tokens,
            page_size: config.page_size,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DomainError> {
        let token = self.tokens.access_token().await?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, DomainError> {
        let mut url = self.documents_root.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::internal("documents root cannot be a base"))?
            .extend(segments);
        Ok(url)
    }

    async fn check(response: Response) -> Result<Response, DomainError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => format!(
                "{} {}: {}",
                envelope.error.code, envelope.error.status, envelope.error.message
            ),
            Err(_) => format!("{status}: {body}"),
        };
        Err(DomainError::external(message))
    }

    fn transport(e: reqwest::Error) -> DomainError {
        DomainError::connection(e.to_string())
    }
}

#[async_trait]
impl DocumentDatabase for FirestoreDatabase {
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentRef>, DomainError> {
        let mut references = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url(&[collection])?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("showMissing", "true")
                    .append_pair("mask.fieldPaths", "__name__")
                    .append_pair("pageSize", &self.page_size.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.send(self.client.get(url)).await?;
            let page: ListDocumentsResponse = Self::check(response)
                .await?
                .json()
                .await
                .map_err(|e| DomainError::internal(e.to_string()))?;

            for document in page.documents {
                let (_, id) = document.name.rsplit_once('/').ok_or_else(|| {
                    DomainError::internal(format!("malformed document name {}", document.name))
                })?;
                references.push(DocumentRef::new(collection, id)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(references)
    }

    async fn get(
        &self,
        reference: &DocumentRef,
    ) -> Result<Option<Map<String, Value>>, DomainError> {
        let url = self.url(&[reference.collection(), reference.name()])?;
        let response = self.send(self.client.get(url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document: FirestoreDocument = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::internal(e.to_string()))?;

        decode_fields(document.fields).map(Some)
    }

    async fn set(
        &self,
        reference: &DocumentRef,
        document: StoredDocument,
    ) -> Result<(), DomainError> {
        // No updateMask: the write replaces every field.
        let url = self.url(&[reference.collection(), reference.name()])?;
        let body = json!({ "fields": encode_fields(document.into_fields())? });

        let response = self.send(self.client.patch(url).json(&body)).await?;
        Self::check(response).await?;

        tracing::debug!(document = %reference, "firestore write committed");
        Ok(())
    }
}
