/// Retrieval-augmented generation service shared by the HTTP and MCP front ends.
use std::sync::Arc;

use question_parser::{EssayQuestion, McqQuestion, ParseResult};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::AppError;
use crate::generator::Generator;
use crate::ingest::Ingestor;
use crate::prompt::is_mcq_request;
use crate::retrieval::{combine, Retriever};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Mcq,
    General,
    Essay,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ResponseMetadata {
    /// Chat model that produced the response.
    pub model: String,
    /// Number of retrieved chunks placed in the prompt context.
    pub document_chunks: usize,
    #[serde(rename = "type")]
    pub kind: ResponseKind,
}

/// Success envelope for every generation request.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RagResponse<T> {
    /// Always `"success"`.
    pub status: String,
    pub query: String,
    pub response: T,
    pub metadata: ResponseMetadata,
}

/// Payload of `/prompt-json`: parsed questions for MCQ requests, otherwise the model's
/// JSON answer as-is.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum JsonPayload {
    Mcq(ParseResult<McqQuestion>),
    General(Value),
}

pub struct RagService {
    retriever: Retriever,
    ingestor: Ingestor,
    generator: Generator,
    default_collection: String,
}

impl RagService {
    pub fn new(
        retriever: Retriever,
        ingestor: Ingestor,
        generator: Generator,
        default_collection: String,
    ) -> Self {
        Self {
            retriever,
            ingestor,
            generator,
            default_collection,
        }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// MCQ generation when the request asks for questions, otherwise a JSON answer.
    pub async fn prompt_json(
        &self,
        question: &str,
        collection: Option<&str>,
    ) -> Result<RagResponse<JsonPayload>, AppError> {
        if is_mcq_request(question) {
            let response = self.generate_mcq(question, collection).await?;
            Ok(response.map(JsonPayload::Mcq))
        } else {
            let response = self.answer_json(question, collection).await?;
            Ok(response.map(JsonPayload::General))
        }
    }

    pub async fn generate_mcq(
        &self,
        question: &str,
        collection: Option<&str>,
    ) -> Result<RagResponse<ParseResult<McqQuestion>>, AppError> {
        let (context, chunks) = self.context(question, collection).await?;
        let parsed = self.generator.generate_mcq(question, &context).await?;
        Ok(self.envelope(question, parsed, chunks, ResponseKind::Mcq))
    }

    pub async fn generate_essay(
        &self,
        question: &str,
        collection: Option<&str>,
    ) -> Result<RagResponse<ParseResult<EssayQuestion>>, AppError> {
        let (context, chunks) = self.context(question, collection).await?;
        let parsed = self.generator.generate_essay(question, &context).await?;
        Ok(self.envelope(question, parsed, chunks, ResponseKind::Essay))
    }

    pub async fn answer_json(
        &self,
        question: &str,
        collection: Option<&str>,
    ) -> Result<RagResponse<Value>, AppError> {
        let (context, chunks) = self.context(question, collection).await?;
        let answer = self.generator.generate_json(question, &context).await?;
        Ok(self.envelope(question, answer, chunks, ResponseKind::General))
    }

    /// Index a PDF. Returns the chunk count and the collection actually written.
    pub async fn upload_pdf(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        collection: Option<&str>,
    ) -> Result<(usize, String), AppError> {
        if !file_name.ends_with(".pdf") {
            return Err(AppError::BadRequest("Only PDF files are allowed.".to_string()));
        }
        let collection = self.resolve(collection).to_string();
        let count = self.ingestor.ingest_pdf(file_name, bytes, &collection).await?;
        Ok((count, collection))
    }

    pub async fn list_collections(&self) -> Result<Vec<String>, AppError> {
        self.retriever.list_collections().await
    }

    pub async fn delete_collection(&self, collection: &str) -> Result<(), AppError> {
        self.retriever.delete_collection(collection).await?;
        info!(collection, "collection deleted");
        Ok(())
    }

    async fn context(
        &self,
        question: &str,
        collection: Option<&str>,
    ) -> Result<(String, usize), AppError> {
        if question.trim().is_empty() {
            return Err(AppError::BadRequest("question must not be empty".to_string()));
        }
        let chunks = self.retriever.retrieve(question, self.resolve(collection)).await?;
        Ok((combine(&chunks), chunks.len()))
    }

    fn resolve<'a>(&'a self, collection: Option<&'a str>) -> &'a str {
        resolve_collection(collection, &self.default_collection)
    }

    fn envelope<T>(
        &self,
        question: &str,
        response: T,
        document_chunks: usize,
        kind: ResponseKind,
    ) -> RagResponse<T> {
        RagResponse {
            status: "success".to_string(),
            query: question.to_string(),
            response,
            metadata: ResponseMetadata {
                model: self.model().to_string(),
                document_chunks,
                kind,
            },
        }
    }
}

impl<T> RagResponse<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RagResponse<U> {
        RagResponse {
            status: self.status,
            query: self.query,
            response: f(self.response),
            metadata: self.metadata,
        }
    }
}

/// Blank or missing names fall back to `default`.
fn resolve_collection<'a>(collection: Option<&'a str>, default: &'a str) -> &'a str {
    match collection.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use question_parser::{AnswerLetter, McqOptions};
    use serde_json::json;

    fn sample(kind: ResponseKind) -> RagResponse<Value> {
        RagResponse {
            status: "success".to_string(),
            query: "Apa itu fotosintesis?".to_string(),
            response: json!({"answer": "proses", "confidence": 0.9}),
            metadata: ResponseMetadata {
                model: "llama3.2:latest".to_string(),
                document_chunks: 4,
                kind,
            },
        }
    }

    #[test]
    fn envelope_serializes_with_type_field() {
        let value = serde_json::to_value(sample(ResponseKind::General)).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "query": "Apa itu fotosintesis?",
                "response": {"answer": "proses", "confidence": 0.9},
                "metadata": {
                    "model": "llama3.2:latest",
                    "document_chunks": 4,
                    "type": "general"
                }
            })
        );
    }

    #[test]
    fn mcq_payload_is_untagged() {
        let questions: ParseResult<McqQuestion> = vec![McqQuestion {
            number: 1,
            question: "Warna klorofil?".to_string(),
            options: McqOptions {
                a: "Merah".to_string(),
                b: "Hijau".to_string(),
                c: "Biru".to_string(),
                d: "Kuning".to_string(),
            },
            answer: AnswerLetter::B,
        }]
        .into();
        let mut envelope = sample(ResponseKind::Mcq).map(|_| JsonPayload::Mcq(questions));
        envelope.metadata.document_chunks = 2;

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["metadata"]["type"], "mcq");
        assert_eq!(value["response"]["total_questions"], 1);
        assert_eq!(value["response"]["questions"][0]["options"]["B"], "Hijau");
        assert_eq!(value["response"]["questions"][0]["answer"], "B");
    }

    #[test]
    fn blank_collection_uses_default() {
        assert_eq!(resolve_collection(None, "default_collection"), "default_collection");
        assert_eq!(resolve_collection(Some("  "), "default_collection"), "default_collection");
        assert_eq!(resolve_collection(Some(" biologi "), "default_collection"), "biologi");
    }
}
