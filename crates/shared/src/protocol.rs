use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{BucketName, StoryKey, TemplateType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryQuery {
    pub bucket: BucketName,
    pub object_key: StoryKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryUploadRequest {
    pub text: String,
    pub filepath: StoryKey,
    pub bucket_name: BucketName,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: Option<StoryKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateQuery {
    pub bucket: BucketName,
    pub story_key: StoryKey,
    pub novel_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub story_continuation: String,
    #[serde(default)]
    pub forecaster_response: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarEntitiesQuery {
    pub query_text: String,
    pub n_results: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarEntity {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarEntitiesResponse {
    #[serde(default)]
    pub entities: Vec<SimilarEntity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAddRequest {
    pub entity: String,
    pub description: String,
    pub key_relations: String,
    pub history: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineEntitiesRequest {
    pub story_text: String,
    pub novel_name: String,
    pub username: String,
}

/// Outcome of an entity-mining job. `result` is passed through as-is for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineEntitiesResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl MineEntitiesResponse {
    pub fn mined_count(&self) -> Option<u64> {
        self.result.get("num_mined_entities").and_then(Value::as_u64)
    }

    pub fn status(&self) -> Option<&str> {
        self.result.get("status").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateQuery {
    pub novel_name: String,
    pub template_type: TemplateType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub novel_name: String,
    pub template_type: String,
    pub prompt_template: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub version: String,
}
