/// MCP front end (stdio transport).
///
/// Exposes four tools:
/// - `generate_mcq`: multiple-choice questions grounded in a collection
/// - `generate_essay`: essay questions with answers and explanations
/// - `answer_json`: free-form JSON answer to a question
/// - `list_collections`: names of the indexed document collections
use std::sync::Arc;

use question_parser::{EssayQuestion, McqQuestion, ParseResult};
use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::service::{RagResponse, RagService};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GenerateParams {
    /// The request, e.g. "Buatkan 5 soal tentang fotosintesis".
    pub question: String,
    /// Collection to retrieve context from (default: the server's default collection).
    pub collection_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CollectionListResponse {
    pub collections: Vec<String>,
}

#[derive(Clone)]
pub struct RagMcpServer {
    service: Arc<RagService>,
    tool_router: ToolRouter<RagMcpServer>,
}

impl RagMcpServer {
    pub fn new(service: Arc<RagService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl RagMcpServer {
    #[tool(description = "Generate multiple-choice questions (options A-D and an answer letter) from the documents in a collection.")]
    async fn generate_mcq(
        &self,
        Parameters(params): Parameters<GenerateParams>,
    ) -> Result<Json<RagResponse<ParseResult<McqQuestion>>>, String> {
        info!(tool = "generate_mcq", "tool invoked");
        self.service
            .generate_mcq(&params.question, params.collection_name.as_deref())
            .await
            .map(Json)
            .map_err(|e| format!("mcq generation failed: {e}"))
    }

    #[tool(description = "Generate essay questions with reference answers and optional explanations from the documents in a collection.")]
    async fn generate_essay(
        &self,
        Parameters(params): Parameters<GenerateParams>,
    ) -> Result<Json<RagResponse<ParseResult<EssayQuestion>>>, String> {
        info!(tool = "generate_essay", "tool invoked");
        self.service
            .generate_essay(&params.question, params.collection_name.as_deref())
            .await
            .map(Json)
            .map_err(|e| format!("essay generation failed: {e}"))
    }

    #[tool(description = "Answer a question from the documents in a collection. The answer is a JSON object with answer, confidence, references and tags.")]
    async fn answer_json(
        &self,
        Parameters(params): Parameters<GenerateParams>,
    ) -> Result<Json<RagResponse<Value>>, String> {
        info!(tool = "answer_json", "tool invoked");
        self.service
            .answer_json(&params.question, params.collection_name.as_deref())
            .await
            .map(Json)
            .map_err(|e| format!("answer failed: {e}"))
    }

    #[tool(description = "List the names of all indexed document collections.")]
    async fn list_collections(&self) -> Result<Json<CollectionListResponse>, String> {
        let collections = self
            .service
            .list_collections()
            .await
            .map_err(|e| format!("listing collections failed: {e}"))?;
        Ok(Json(CollectionListResponse { collections }))
    }
}

#[tool_handler]
impl ServerHandler for RagMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "rag-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Question generation over uploaded PDF collections. Use generate_mcq for \
                 multiple-choice questions, generate_essay for essay questions, answer_json \
                 for a direct answer, and list_collections to see which collections exist."
                    .to_string(),
            ),
        }
    }
}
