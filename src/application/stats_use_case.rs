// ============================================================
// Layer 2 — StatsUseCase
// ============================================================
// Reports parameter count, size, vocabulary and bit width of a
// saved model without chatting with it.

use anyhow::{anyhow, Result};
use std::path::Path;

use crate::application::chat_use_case::ChatUseCase;
use crate::application::session::ModelStats;
use crate::domain::traits::ModelBackend;

pub fn model_stats<Bk: ModelBackend>(backend: Bk, model_path: &Path) -> Result<ModelStats> {
    ChatUseCase::open(backend, model_path)?
        .stats()
        .ok_or_else(|| anyhow!("'{}' did not produce a model", model_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tokenizer::WordTokenizer;
    use crate::domain::bits::BitWidth;
    use crate::infra::model_store::{ModelDocument, ModelStore};
    use crate::ml::testing::{FakeBackend, FakeModel};

    #[test]
    fn test_stats_of_saved_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut tokenizer = WordTokenizer::new();
        tokenizer.fit(&["one two three"], 1);
        let model = FakeModel::new(tokenizer.vocab_size());
        let doc   = ModelDocument::capture(&tokenizer, &model, BitWidth::Sixteen).unwrap();
        let path  = dir.path().join("m.json");
        ModelStore::new(&path).save(&doc).unwrap();

        let stats = model_stats(FakeBackend::default(), &path).unwrap();
        assert_eq!(stats.vocab_size, 7);
        assert_eq!(stats.total_params, 7);
        assert_eq!(stats.bits, BitWidth::Sixteen);
        assert_eq!(stats.device, "fake");
        assert!(stats.last_trained.is_none());
    }
}
