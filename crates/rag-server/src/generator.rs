/// Question generation: prompt the chat model and parse its reply into typed results.
use question_parser::{
    extract_json_reply, EssayQuestion, McqQuestion, ParseResult, QuestionParser,
};
use rag_common::chat::ChatClient;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::AppError;
use crate::prompt;

pub struct Generator {
    chat: ChatClient,
    parser: &'static QuestionParser,
    model: String,
}

impl Generator {
    pub fn new(chat: ChatClient, parser: &'static QuestionParser, model: String) -> Self {
        Self {
            chat,
            parser,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_mcq(
        &self,
        question: &str,
        context: &str,
    ) -> Result<ParseResult<McqQuestion>, AppError> {
        let reply = self.complete(&prompt::mcq_prompt(question, context)).await?;
        let parsed = self.parser.parse_mcq(&reply);
        log_yield("mcq", &reply, parsed.total_questions);
        Ok(parsed)
    }

    pub async fn generate_essay(
        &self,
        question: &str,
        context: &str,
    ) -> Result<ParseResult<EssayQuestion>, AppError> {
        let reply = self.complete(&prompt::essay_prompt(question, context)).await?;
        let parsed = self.parser.parse_essay(&reply);
        log_yield("essay", &reply, parsed.total_questions);
        Ok(parsed)
    }

    /// Free-form answer. The reply must be JSON, bare or inside a ```json fence.
    pub async fn generate_json(&self, question: &str, context: &str) -> Result<Value, AppError> {
        let reply = self.complete(&prompt::json_prompt(question, context)).await?;
        extract_json_reply(&reply)
            .inspect_err(|_| warn!(reply_chars = reply.chars().count(), "model reply is not JSON"))
            .map_err(AppError::from)
    }

    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        Ok(self.chat.complete(&self.model, prompt).await?)
    }
}

fn log_yield(kind: &str, reply: &str, questions: usize) {
    if questions == 0 {
        warn!(kind, reply_chars = reply.chars().count(), "model reply produced no questions");
    } else {
        info!(kind, questions, "questions generated");
    }
}
