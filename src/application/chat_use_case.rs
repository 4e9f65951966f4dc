// ============================================================
// Layer 2 — ChatUseCase
// ============================================================
// Loads a saved model into a fresh session and answers
// messages with it, one greedy reply per message.
//
// Used by the `chat` command both for a single --message and
// for the interactive stdin loop.

use anyhow::{Context, Result};
use std::path::Path;

use crate::application::session::{ChatMessage, ChatSession, ModelStats, SessionSettings};
use crate::domain::traits::ModelBackend;
use crate::infra::model_store::ModelStore;

pub struct ChatUseCase<Bk: ModelBackend> {
    session: ChatSession<Bk>,
}

impl<Bk: ModelBackend> ChatUseCase<Bk> {
    pub fn open(backend: Bk, model_path: &Path) -> Result<Self> {
        Self::open_with(backend, model_path, SessionSettings::default())
    }

    /// `settings.max_response_length` bounds every reply
    pub fn open_with(backend: Bk, model_path: &Path, settings: SessionSettings) -> Result<Self> {
        let mut session = ChatSession::new(backend, settings);
        session
            .load_model(&ModelStore::new(model_path))
            .with_context(|| format!("Cannot load model '{}'", model_path.display()))?;
        Ok(Self { session })
    }

    pub fn reply(&mut self, message: &str) -> Result<String> {
        Ok(self.session.send_message(message)?)
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        self.session.transcript()
    }

    pub fn stats(&self) -> Option<ModelStats> {
        self.session.stats()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::Speaker;
    use crate::data::tokenizer::WordTokenizer;
    use crate::domain::bits::BitWidth;
    use crate::domain::error::{SessionError, UserInputError};
    use crate::infra::model_store::ModelDocument;
    use crate::ml::generator::FALLBACK_RESPONSE;
    use crate::ml::testing::{FakeBackend, FakeModel};

    fn saved_model(dir: &Path) -> std::path::PathBuf {
        let mut tokenizer = WordTokenizer::new();
        // hello=4 world=5
        tokenizer.fit(&["hello world"], 1);
        let model = FakeModel::new(tokenizer.vocab_size()).with_transitions(&[(4, 5), (5, 3)]);
        let doc   = ModelDocument::capture(&tokenizer, &model, BitWidth::Eight).unwrap();

        let path = dir.join("hello.json");
        ModelStore::new(&path).save(&doc).unwrap();
        path
    }

    #[test]
    fn test_reply_follows_saved_transitions() {
        let dir      = tempfile::tempdir().unwrap();
        let mut chat = ChatUseCase::open(FakeBackend::default(), &saved_model(dir.path())).unwrap();

        assert_eq!(chat.reply("Hello!").unwrap(), "world");
        assert_eq!(chat.reply("world").unwrap(), FALLBACK_RESPONSE);

        let speakers: Vec<Speaker> = chat.transcript().iter().map(|m| m.speaker).collect();
        assert_eq!(
            speakers,
            vec![Speaker::User, Speaker::Assistant, Speaker::User, Speaker::Assistant]
        );
        assert_eq!(chat.stats().unwrap().bits, BitWidth::Eight);
    }

    #[test]
    fn test_empty_message_rejected() {
        let dir      = tempfile::tempdir().unwrap();
        let mut chat = ChatUseCase::open(FakeBackend::default(), &saved_model(dir.path())).unwrap();
        let err      = chat.reply("  ").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::UserInput(UserInputError::EmptyMessage))
        ));
    }

    #[test]
    fn test_open_missing_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ChatUseCase::open(FakeBackend::default(), &dir.path().join("none.json")).is_err());
    }
}
