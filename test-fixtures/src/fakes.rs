//! Deterministic stand-ins for model backends.
//!
//! Tokenization hashes words into a small vocabulary, so the same word always
//! maps to the same id and the same token vector. Texts that share words get
//! similar dense vectors, overlapping sparse terms, and high MaxSim.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use recall_core::errors::{EmbeddingError, RecallResult};
use recall_core::models::{ModelOutput, TokenizedInput};
use recall_core::traits::{BackendLoader, InferenceBackend};

pub const CLS: u32 = 101;
pub const SEP: u32 = 102;
/// Word ids start here so they never collide with special tokens.
pub const FIRST_WORD_ID: u32 = 200;
pub const DEFAULT_VOCAB: usize = 1024;

/// What `run` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOutput {
    /// `[1, seq, dim]` per-token hidden states.
    TokenStates { dim: usize },
    /// `[1, dim]` already pooled.
    Pooled { dim: usize },
    /// `[1, seq, vocab]` MLM logits: 2.0 at each token's own id, -1.0 elsewhere.
    MlmLogits,
    /// `[1, 1]` relevance logit: shared words between the two segments, minus 1.
    PairLogit,
    /// Every `run` fails.
    Broken,
}

fn fnv1a(bytes: &[u8]) -> u32 {
    let mut h: u32 = 0x811c9dc5;
    for b in bytes {
        h ^= *b as u32;
        h = h.wrapping_mul(0x01000193);
    }
    h
}

fn splitmix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}

/// Word id in `[FIRST_WORD_ID, vocab)`.
pub fn word_id(word: &str, vocab: usize) -> u32 {
    let span = (vocab as u32).saturating_sub(FIRST_WORD_ID).max(1);
    FIRST_WORD_ID + fnv1a(word.to_lowercase().as_bytes()) % span
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
}

/// `[CLS] w1 w2 ... [SEP]`, truncated to `max_tokens`.
pub fn fake_tokenize(text: &str, vocab: usize, max_tokens: usize) -> TokenizedInput {
    let mut ids = vec![CLS];
    ids.extend(words(text).map(|w| word_id(w, vocab)));
    ids.push(SEP);
    let mask = vec![1; ids.len()];
    let mut input = TokenizedInput::new(ids, mask);
    input.truncate(max_tokens);
    input
}

/// Deterministic token vector in `[-1, 1]^dim`.
pub fn token_vector(id: u32, dim: usize) -> Vec<f32> {
    (0..dim)
        .map(|d| {
            let bits = splitmix(((id as u64) << 20) | d as u64);
            (bits % 2001) as f32 / 1000.0 - 1.0
        })
        .collect()
}

pub struct HashingBackend {
    name: String,
    output: FakeOutput,
    vocab: usize,
    runs: Arc<AtomicUsize>,
}

impl HashingBackend {
    pub fn new(name: &str, output: FakeOutput, vocab: usize) -> Self {
        Self {
            name: name.to_string(),
            output,
            vocab,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn pair_logit(ids: &[u32]) -> f32 {
        let mut segments = ids
            .split(|&id| id == SEP)
            .map(|seg| seg.iter().filter(|&&id| id >= FIRST_WORD_ID).copied());
        let first: Vec<u32> = segments.next().map(|s| s.collect()).unwrap_or_default();
        let second: Vec<u32> = segments.next().map(|s| s.collect()).unwrap_or_default();
        let mut shared: Vec<u32> = first.into_iter().filter(|id| second.contains(id)).collect();
        shared.sort_unstable();
        shared.dedup();
        shared.len() as f32 - 1.0
    }
}

#[async_trait]
impl InferenceBackend for HashingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn tokenize(&self, text: &str, max_tokens: usize) -> RecallResult<TokenizedInput> {
        Ok(fake_tokenize(text, self.vocab, max_tokens))
    }

    fn tokenize_pair(
        &self,
        first: &str,
        second: &str,
        max_tokens: usize,
    ) -> RecallResult<TokenizedInput> {
        let mut ids = fake_tokenize(first, self.vocab, usize::MAX).ids;
        ids.extend(words(second).map(|w| word_id(w, self.vocab)));
        ids.push(SEP);
        let mask = vec![1; ids.len()];
        let mut input = TokenizedInput::new(ids, mask);
        input.truncate(max_tokens);
        Ok(input)
    }

    async fn run(&self, input: &TokenizedInput) -> RecallResult<ModelOutput> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let seq = input.len();
        match self.output {
            FakeOutput::TokenStates { dim } => {
                let data = input
                    .ids
                    .iter()
                    .flat_map(|&id| token_vector(id, dim))
                    .collect();
                Ok(ModelOutput::new(vec![1, seq, dim], data))
            }
            FakeOutput::Pooled { dim } => {
                let mut pooled = vec![0.0f32; dim];
                for &id in &input.ids {
                    for (acc, v) in pooled.iter_mut().zip(token_vector(id, dim)) {
                        *acc += v;
                    }
                }
                Ok(ModelOutput::new(vec![1, dim], pooled))
            }
            FakeOutput::MlmLogits => {
                let mut data = vec![-1.0f32; seq * self.vocab];
                for (p, &id) in input.ids.iter().enumerate() {
                    if id >= FIRST_WORD_ID && (id as usize) < self.vocab {
                        data[p * self.vocab + id as usize] = 2.0;
                    }
                }
                Ok(ModelOutput::new(vec![1, seq, self.vocab], data))
            }
            FakeOutput::PairLogit => Ok(ModelOutput::new(
                vec![1, 1],
                vec![Self::pair_logit(&input.ids)],
            )),
            FakeOutput::Broken => Err(EmbeddingError::InferenceFailed {
                reason: format!("{} is broken", self.name),
            }
            .into()),
        }
    }
}

/// Loader for a [`HashingBackend`] that counts loads and forward passes.
pub struct HashingLoader {
    model_id: String,
    output: FakeOutput,
    vocab: usize,
    loads: AtomicUsize,
    runs: Arc<AtomicUsize>,
}

impl HashingLoader {
    pub fn with_output(model_id: &str, output: FakeOutput) -> Self {
        Self {
            model_id: model_id.to_string(),
            output,
            vocab: DEFAULT_VOCAB,
            loads: AtomicUsize::new(0),
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Per-token hidden states of width `dim`.
    pub fn new(model_id: &str, dim: usize) -> Self {
        Self::with_output(model_id, FakeOutput::TokenStates { dim })
    }

    pub fn pooled(model_id: &str, dim: usize) -> Self {
        Self::with_output(model_id, FakeOutput::Pooled { dim })
    }

    pub fn splade(model_id: &str) -> Self {
        Self::with_output(model_id, FakeOutput::MlmLogits)
    }

    pub fn cross_encoder(model_id: &str) -> Self {
        Self::with_output(model_id, FakeOutput::PairLogit)
    }

    /// Loads fine, fails every forward pass.
    pub fn broken(model_id: &str) -> Self {
        Self::with_output(model_id, FakeOutput::Broken)
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Forward passes across every backend this loader produced.
    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn vocab(&self) -> usize {
        self.vocab
    }
}

#[async_trait]
impl BackendLoader for HashingLoader {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn load(&self) -> RecallResult<Arc<dyn InferenceBackend>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let mut backend = HashingBackend::new(&self.model_id, self.output, self.vocab);
        backend.runs = Arc::clone(&self.runs);
        Ok(Arc::new(backend))
    }
}

/// Loader that always fails.
pub struct FailingLoader {
    model_id: String,
    reason: String,
    loads: AtomicUsize,
}

impl FailingLoader {
    pub fn new(model_id: &str, reason: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            reason: reason.to_string(),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendLoader for FailingLoader {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn load(&self) -> RecallResult<Arc<dyn InferenceBackend>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Err(EmbeddingError::BackendLoadFailed {
            model: self.model_id.clone(),
            reason: self.reason.clone(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_word_same_id() {
        assert_eq!(word_id("Login", 1024), word_id("login", 1024));
        assert!(word_id("login", 1024) >= FIRST_WORD_ID);
        assert!((word_id("login", 1024) as usize) < 1024);
    }

    #[test]
    fn tokenize_wraps_with_specials_and_truncates() {
        let input = fake_tokenize("fix the login bug", 1024, 512);
        assert_eq!(input.ids.first(), Some(&CLS));
        assert_eq!(input.ids.last(), Some(&SEP));
        assert_eq!(input.len(), 6);
        assert_eq!(fake_tokenize("a b c d e f", 1024, 3).len(), 3);
    }

    #[test]
    fn pair_logit_counts_shared_words() {
        let backend = HashingBackend::new("ce", FakeOutput::PairLogit, 1024);
        let input = backend
            .tokenize_pair("login bug", "fixed the login bug today", 512)
            .unwrap();
        assert_eq!(HashingBackend::pair_logit(&input.ids), 1.0);
    }

    #[tokio::test]
    async fn mlm_logits_mark_token_ids() {
        let backend = HashingBackend::new("splade", FakeOutput::MlmLogits, 1024);
        let input = backend.tokenize("alpha", 512).unwrap();
        let out = backend.run(&input).await.unwrap();
        assert_eq!(out.shape, vec![1, 3, 1024]);
        let id = word_id("alpha", 1024) as usize;
        assert_eq!(out.data[1024 + id], 2.0);
    }

    #[tokio::test]
    async fn broken_backend_fails_runs() {
        let loader = HashingLoader::broken("ce");
        let backend = loader.load().await.unwrap();
        let input = backend.tokenize("x", 8).unwrap();
        assert!(backend.run(&input).await.is_err());
        assert_eq!(loader.run_count(), 1);
    }
}
