//! Request/response clients for the NovelWriter `/api` service.
//!
//! Each remote collaborator is a separate trait so the orchestration layer can
//! be driven by in-memory fakes. [`NovelWriterClient`] implements all of them
//! over HTTP. None of the clients retry; deadlines are the caller's concern.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{BucketName, StoryKey, TemplateType},
    error::ErrorBody,
    protocol::{
        EntityAck, EntityAddRequest, GenerateQuery, GenerateResponse, MineEntitiesRequest,
        MineEntitiesResponse, PromptTemplate, SimilarEntitiesQuery, SimilarEntitiesResponse,
        SimilarEntity, StoryContent, StoryQuery, StoryUploadRequest, TemplateQuery, UploadAck,
    },
};
use tracing::{debug, warn};
use url::Url;

pub mod error;

pub use error::ClientError;

pub type ClientResult<T> = Result<T, ClientError>;

#[async_trait]
pub trait StoryApi: Send + Sync {
    async fn upload_story(&self, request: &StoryUploadRequest) -> ClientResult<UploadAck>;
    async fn fetch_story(&self, bucket: &BucketName, key: &StoryKey) -> ClientResult<StoryContent>;
}

#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn generate(&self, query: &GenerateQuery) -> ClientResult<GenerateResponse>;
}

#[async_trait]
pub trait EntityApi: Send + Sync {
    async fn add_entity(&self, request: &EntityAddRequest) -> ClientResult<EntityAck>;
    async fn similar_entities(
        &self,
        query_text: &str,
        n_results: u32,
    ) -> ClientResult<Vec<SimilarEntity>>;
}

#[async_trait]
pub trait MiningApi: Send + Sync {
    /// May run for several minutes; callers apply their own deadline.
    async fn mine_entities(&self, request: &MineEntitiesRequest)
        -> ClientResult<MineEntitiesResponse>;
}

#[async_trait]
pub trait TemplateApi: Send + Sync {
    async fn template(
        &self,
        novel_name: &str,
        template_type: TemplateType,
    ) -> ClientResult<PromptTemplate>;
}

/// Every remote collaborator the editor talks to.
pub trait NovelWriterApi: StoryApi + GenerationApi + EntityApi + MiningApi + TemplateApi {}

impl<T> NovelWriterApi for T where T: StoryApi + GenerationApi + EntityApi + MiningApi + TemplateApi {}

#[derive(Debug, Clone)]
pub struct NovelWriterClient {
    http: Client,
    base_url: Url,
}

impl NovelWriterClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_http_client(Client::new(), base_url)
    }

    pub fn with_http_client(http: Client, base_url: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }
}

fn require_non_empty(value: &str, message: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(message.to_string()));
    }
    Ok(())
}

async fn read_json<T: DeserializeOwned>(endpoint: &'static str, response: Response) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        let raw = response.text().await.unwrap_or_default();
        let detail = ErrorBody::parse_detail(&raw);
        warn!(
            endpoint,
            status = status.as_u16(),
            detail = detail.as_deref().unwrap_or(""),
            "api request failed"
        );
        return Err(ClientError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    debug!(endpoint, status = status.as_u16(), "api request succeeded");
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl StoryApi for NovelWriterClient {
    async fn upload_story(&self, request: &StoryUploadRequest) -> ClientResult<UploadAck> {
        require_non_empty(request.bucket_name.as_str(), "bucket name is required")?;
        require_non_empty(request.filepath.as_str(), "story path is required")?;
        let res = self
            .http
            .post(self.endpoint("story")?)
            .json(request)
            .send()
            .await?;
        read_json("POST /story", res).await
    }

    async fn fetch_story(&self, bucket: &BucketName, key: &StoryKey) -> ClientResult<StoryContent> {
        require_non_empty(bucket.as_str(), "bucket name is required")?;
        require_non_empty(key.as_str(), "story path is required")?;
        let query = StoryQuery {
            bucket: bucket.clone(),
            object_key: key.clone(),
        };
        let res = self
            .http
            .get(self.endpoint("story")?)
            .query(&query)
            .send()
            .await?;
        read_json("GET /story", res).await
    }
}

#[async_trait]
impl GenerationApi for NovelWriterClient {
    async fn generate(&self, query: &GenerateQuery) -> ClientResult<GenerateResponse> {
        let res = self
            .http
            .get(self.endpoint("generate")?)
            .query(query)
            .send()
            .await?;
        read_json("GET /generate", res).await
    }
}

#[async_trait]
impl EntityApi for NovelWriterClient {
    async fn add_entity(&self, request: &EntityAddRequest) -> ClientResult<EntityAck> {
        require_non_empty(&request.entity, "entity name is required")?;
        require_non_empty(&request.description, "entity description is required")?;
        let res = self
            .http
            .post(self.endpoint("entity")?)
            .json(request)
            .send()
            .await?;
        read_json("POST /entity", res).await
    }

    async fn similar_entities(
        &self,
        query_text: &str,
        n_results: u32,
    ) -> ClientResult<Vec<SimilarEntity>> {
        let query = SimilarEntitiesQuery {
            query_text: query_text.to_string(),
            n_results,
        };
        let res = self
            .http
            .get(self.endpoint("similar_entities")?)
            .query(&query)
            .send()
            .await?;
        let body: SimilarEntitiesResponse = read_json("GET /similar_entities", res).await?;
        Ok(body.entities)
    }
}

#[async_trait]
impl MiningApi for NovelWriterClient {
    async fn mine_entities(
        &self,
        request: &MineEntitiesRequest,
    ) -> ClientResult<MineEntitiesResponse> {
        let res = self
            .http
            .post(self.endpoint("mine_entities")?)
            .json(request)
            .send()
            .await?;
        read_json("POST /mine_entities", res).await
    }
}

#[async_trait]
impl TemplateApi for NovelWriterClient {
    async fn template(
        &self,
        novel_name: &str,
        template_type: TemplateType,
    ) -> ClientResult<PromptTemplate> {
        let query = TemplateQuery {
            novel_name: novel_name.to_string(),
            template_type,
        };
        let res = self
            .http
            .get(self.endpoint("templates")?)
            .query(&query)
            .send()
            .await?;
        read_json("GET /templates", res).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
