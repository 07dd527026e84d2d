//! Machine Translation Module
//!
//! This module turns English site content into Korean and Chinese on demand.
//! It layers a persistent cache and a chunking engine over a set of
//! interchangeable translation providers, and never fails a caller: when every
//! provider is down, the original text comes back.
//!
//! # Overview
//!
//! 1. **Providers** - [`MachineTranslator`] implementations: a keyed premium
//!    provider ([`GoogleTranslateProvider`]) and free community endpoints
//!    ([`CommunityProvider`])
//! 2. **Cache** - TTL-bound store keyed by target language and text hash
//! 3. **Chunking** - paragraph, sentence and word splitting for long content
//! 4. **Service** - the orchestrator tying the three together
//!
//! # Example
//!
//! ```ignore
//! use relay_i18n::mt::{TranslationConfig, TranslationService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TranslationConfig::from_env()?;
//!     let service = TranslationService::from_config(&config)?;
//!
//!     let korean = service.translate_text("Hello World", "ko", Some("en")).await;
//!     println!("{}", korean);
//!     Ok(())
//! }
//! ```
pub mod cache;
pub mod chunking;
pub mod community;
pub mod config;
pub mod error;
pub mod google_translate;
pub mod mock;
pub mod service;
pub mod translator;


pub use cache::{
    CacheBackend, CacheEntry, CacheHealth, CacheStats, FileBackend, MemoryBackend,
    TranslationCache, cache_key, format_bytes,
};
pub use chunking::{ChunkPlan, ChunkingConfig, split_into_chunks, split_paragraphs};
pub use community::{CommunityProvider, ProviderDescriptor};
pub use config::TranslationConfig;
pub use error::{MtError, MtResult};
pub use google_translate::GoogleTranslateProvider;
pub use mock::{MockMode, MockTranslator};
pub use service::{
    MethodInfo, ProviderStatusReport, ProviderTier, TranslationMethod, TranslationOutcome,
    TranslationRequest, TranslationService, TranslationTestReport,
};
pub use translator::MachineTranslator;
