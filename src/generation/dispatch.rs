use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::error_handling::types::GenerationError;
use crate::generation::history::{ChatMessage, ConversationStore};
use crate::generation::provider::ResponseGenerator;
use crate::logging::context::SessionContext;

/// Reply substituted whenever generation fails; the remote party must never
/// observe an internal error.
pub const FALLBACK_REPLY: &str = "Command executed successfully.";

/// Banner substituted when welcome generation fails.
pub const FALLBACK_WELCOME: &str = "Welcome to the system!";

const WELCOME_PROMPT: &str =
    "Generate a realistic SSH welcome message following Linux system rules.";

/// Response generation dispatch.
///
/// Bounds each session's conversation history by the configured token
/// budget, requests a deceptive reply from the generation collaborator, and
/// substitutes the deterministic fallback on any failure. Every call and
/// its outcome is logged.
pub struct ResponseDispatch {
    generator: Arc<dyn ResponseGenerator>,
    store: Arc<ConversationStore>,
    system_prompt: String,
    max_tokens: usize,
}

impl ResponseDispatch {
    pub fn new(
        generator: Arc<dyn ResponseGenerator>,
        store: Arc<ConversationStore>,
        system_prompt: String,
        max_tokens: usize,
    ) -> Self {
        Self {
            generator,
            store,
            system_prompt,
            max_tokens,
        }
    }

    /// Produces the reply shown for one command.
    pub async fn respond(&self, ctx: &SessionContext, session_id: Uuid, input: &str) -> String {
        self.invoke(ctx, session_id, input, FALLBACK_REPLY).await
    }

    /// Produces the interactive welcome banner.
    pub async fn welcome(&self, ctx: &SessionContext, session_id: Uuid) -> String {
        self.invoke(ctx, session_id, WELCOME_PROMPT, FALLBACK_WELCOME)
            .await
    }

    /// Drops the session's history once it closes.
    pub fn forget(&self, session_id: Uuid) {
        self.store.forget(session_id);
    }

    async fn invoke(
        &self,
        ctx: &SessionContext,
        session_id: Uuid,
        input: &str,
        fallback: &str,
    ) -> String {
        self.store.push(session_id, ChatMessage::user(input));
        self.store.trim_to(session_id, self.max_tokens);

        let mut messages = vec![ChatMessage::system(self.system_prompt.clone())];
        messages.extend(self.store.history(session_id));

        match self.checked_generate(&messages).await {
            Ok(text) => {
                self.store
                    .push(session_id, ChatMessage::assistant(text.clone()));
                ctx.info_fields("AI Response", json!({"details": text}));
                text
            }
            Err(e) => {
                ctx.error_fields(
                    "Error generating AI response",
                    json!({"error": e.to_string()}),
                );
                fallback.to_string()
            }
        }
    }

    async fn checked_generate(
        &self,
        messages: &[ChatMessage],
    ) -> Result<String, GenerationError> {
        let text = self.generator.generate(messages).await?;
        if text.trim().is_empty() {
            return Err(GenerationError::InvalidResponse(String::from(
                "empty completion",
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::history::Role;
    use crate::logging::event_log::EventLog;
    use crate::logging::record::LogRecord;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::tempdir;

    struct EchoGenerator;

    #[async_trait]
    impl ResponseGenerator for EchoGenerator {
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
            let last = messages.last().unwrap();
            Ok(format!("echo: {}", last.content))
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl ResponseGenerator for BrokenGenerator {
        async fn generate(&self, _messages: &[ChatMessage]) -> Result<String, GenerationError> {
            Err(GenerationError::Timeout(30))
        }
    }

    struct BlankGenerator;

    #[async_trait]
    impl ResponseGenerator for BlankGenerator {
        async fn generate(&self, _messages: &[ChatMessage]) -> Result<String, GenerationError> {
            Ok(String::from("   \n"))
        }
    }

    fn dispatch(generator: Arc<dyn ResponseGenerator>) -> (ResponseDispatch, Arc<ConversationStore>) {
        let store = Arc::new(ConversationStore::new());
        let dispatch = ResponseDispatch::new(
            generator,
            Arc::clone(&store),
            String::from("Simulate a realistic Linux system."),
            64000,
        );
        (dispatch, store)
    }

    fn context(dir: &tempfile::TempDir) -> (SessionContext, std::path::PathBuf) {
        let path = dir.path().join("events.jsonl");
        let log = Arc::new(EventLog::open(&path, "lab").unwrap());
        (SessionContext::for_process(log), path)
    }

    #[tokio::test]
    async fn test_successful_reply_extends_history() {
        let dir = tempdir().unwrap();
        let (ctx, _) = context(&dir);
        let (dispatch, store) = dispatch(Arc::new(EchoGenerator));
        let id = Uuid::new_v4();

        let reply = dispatch.respond(&ctx, id, "uname -a").await;
        assert_eq!(reply, "echo: uname -a");

        let history = store.history(id);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "echo: uname -a");
    }

    #[tokio::test]
    async fn test_failure_substitutes_fixed_acknowledgement() {
        let dir = tempdir().unwrap();
        let (ctx, path) = context(&dir);
        let (dispatch, store) = dispatch(Arc::new(BrokenGenerator));
        let id = Uuid::new_v4();

        let reply = dispatch.respond(&ctx, id, "ls").await;
        assert_eq!(reply, FALLBACK_REPLY);

        // No assistant message is recorded for a failed call.
        let history = store.history(id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);

        let raw = fs::read_to_string(&path).unwrap();
        let record: LogRecord = serde_json::from_str(raw.lines().last().unwrap()).unwrap();
        assert_eq!(record.message, "Error generating AI response");
    }

    #[tokio::test]
    async fn test_blank_completion_counts_as_failure() {
        let dir = tempdir().unwrap();
        let (ctx, _) = context(&dir);
        let (dispatch, _store) = dispatch(Arc::new(BlankGenerator));
        let id = Uuid::new_v4();

        let reply = dispatch.respond(&ctx, id, "ls").await;
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_welcome_falls_back_to_fixed_banner() {
        let dir = tempdir().unwrap();
        let (ctx, _) = context(&dir);
        let (dispatch, _store) = dispatch(Arc::new(BrokenGenerator));
        let id = Uuid::new_v4();

        let banner = dispatch.welcome(&ctx, id).await;
        assert_eq!(banner, FALLBACK_WELCOME);
    }

    #[tokio::test]
    async fn test_forget_clears_session_history() {
        let dir = tempdir().unwrap();
        let (ctx, _) = context(&dir);
        let (dispatch, store) = dispatch(Arc::new(EchoGenerator));
        let id = Uuid::new_v4();

        dispatch.respond(&ctx, id, "pwd").await;
        assert_eq!(store.session_count(), 1);

        dispatch.forget(id);
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn test_success_outcome_is_logged() {
        let dir = tempdir().unwrap();
        let (ctx, path) = context(&dir);
        let (dispatch, _store) = dispatch(Arc::new(EchoGenerator));
        let id = Uuid::new_v4();

        dispatch.respond(&ctx, id, "whoami").await;

        let raw = fs::read_to_string(&path).unwrap();
        let record: LogRecord = serde_json::from_str(raw.lines().last().unwrap()).unwrap();
        assert_eq!(record.message, "AI Response");
        assert_eq!(record.extra["details"], "echo: whoami");
    }
}
