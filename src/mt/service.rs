//! Translation orchestrator
//!
//! [`TranslationService`] is the single entry point the rest of the site
//! uses. For every request it walks the same sequence:
//!
//! 1. validate the target language; echo the input for the default language
//! 2. serve from the cache when possible
//! 3. try the premium provider (when a key is configured), then each free
//!    provider in priority order, one at a time
//! 4. for long text, translate chunk by chunk and reassemble
//! 5. if nothing worked, hand back the original text with `success == false`
//!
//! Callers never see an error: failure is a flag on [`TranslationOutcome`].

use crate::language::Language;
use crate::mt::cache::{CacheStats, TranslationCache};
use crate::mt::chunking::{ChunkPlan, ChunkingConfig};
use crate::mt::community::CommunityProvider;
use crate::mt::config::TranslationConfig;
use crate::mt::error::{MtError, MtResult};
use crate::mt::google_translate::GoogleTranslateProvider;
use crate::mt::translator::{AUTO_LOCALE, MachineTranslator, normalize_locale};
use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Text sent by [`TranslationService::check_provider_status`]
const STATUS_CHECK_TEXT: &str = "Hello";

/// One translation job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub target_language: String,
    pub source_language: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_language: target_language.into(),
            source_language: AUTO_LOCALE.to_string(),
        }
    }

    pub fn with_source(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = source_language.into();
        self
    }
}

/// How a translation was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TranslationMethod {
    Cache,
    Provider(String),
    Chunked,
    /// Nothing to do: default language, same source and target, or blank text
    Passthrough,
    /// Every attempt failed; the text is the original
    Fallback,
}

impl TranslationMethod {
    pub fn method_name(&self) -> &str {
        match self {
            TranslationMethod::Cache => "cache",
            TranslationMethod::Provider(name) => name,
            TranslationMethod::Chunked => "chunked",
            TranslationMethod::Passthrough => "passthrough",
            TranslationMethod::Fallback => "fallback",
        }
    }
}

impl fmt::Display for TranslationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationOutcome {
    pub success: bool,
    pub text: String,
    pub method: TranslationMethod,
}

impl TranslationOutcome {
    fn passthrough(text: &str) -> Self {
        Self {
            success: true,
            text: text.to_string(),
            method: TranslationMethod::Passthrough,
        }
    }

    fn fallback(text: &str) -> Self {
        Self {
            success: false,
            text: text.to_string(),
            method: TranslationMethod::Fallback,
        }
    }

    fn cached(text: String) -> Self {
        Self {
            success: true,
            text,
            method: TranslationMethod::Cache,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub available: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedProviderStatus {
    pub name: String,
    pub available: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatusReport {
    pub premium: ProviderStatus,
    pub free: Vec<NamedProviderStatus>,
}

/// Result of a one-off diagnostic translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationTestReport {
    pub success: bool,
    pub original_text: String,
    pub translated_text: String,
    pub method: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProviderTier {
    Premium,
    Free,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodInfo {
    pub name: String,
    pub tier: ProviderTier,
    /// Premium needs a key; free providers are always configured
    pub configured: bool,
}

/// Builder for [`TranslationService`]
#[derive(Default)]
pub struct TranslationServiceBuilder {
    premium: Option<Arc<dyn MachineTranslator>>,
    providers: Vec<Arc<dyn MachineTranslator>>,
    cache: Option<TranslationCache>,
    config: TranslationConfig,
}

impl TranslationServiceBuilder {
    /// Credential-gated provider tried before every free provider
    pub fn premium(mut self, provider: impl MachineTranslator + 'static) -> Self {
        self.premium = Some(Arc::new(provider));
        self
    }

    /// Free provider; ordered by [`MachineTranslator::priority`] at build time
    pub fn provider(mut self, provider: impl MachineTranslator + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn cache(mut self, cache: TranslationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(mut self, config: TranslationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TranslationService {
        let mut providers = self.providers;
        // Stable sort: equal priorities keep registration order
        providers.sort_by_key(|provider| provider.priority());

        let cache = self.cache.unwrap_or_else(|| {
            TranslationCache::new(
                Arc::new(crate::mt::cache::MemoryBackend::new()),
                self.config.cache_ttl(),
            )
        });

        TranslationService {
            premium: self.premium,
            providers,
            cache,
            chunking: self.config.chunking(),
            request_timeout: self.config.request_timeout(),
            cleanup_interval: self.config.cleanup_interval(),
        }
    }
}

/// Cache-then-fallback translation orchestrator
pub struct TranslationService {
    premium: Option<Arc<dyn MachineTranslator>>,
    providers: Vec<Arc<dyn MachineTranslator>>,
    cache: TranslationCache,
    chunking: ChunkingConfig,
    request_timeout: Duration,
    cleanup_interval: Duration,
}

impl fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationService")
            .field(
                "premium",
                &self.premium.as_ref().map(|p| p.provider_name().to_string()),
            )
            .field(
                "providers",
                &self
                    .providers
                    .iter()
                    .map(|p| p.provider_name().to_string())
                    .collect::<Vec<_>>(),
            )
            .field("cache", &self.cache)
            .field("chunking", &self.chunking)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl TranslationService {
    pub fn builder() -> TranslationServiceBuilder {
        TranslationServiceBuilder::default()
    }

    /// Production wiring: Google when a key is configured, every community
    /// provider, and the cache described by `config`.
    pub fn from_config(config: &TranslationConfig) -> MtResult<Self> {
        let timeout = config.request_timeout();
        let mut builder = Self::builder().config(config.clone());

        if let Some(key) = config.premium_key() {
            builder = builder.premium(GoogleTranslateProvider::with_timeout(key.to_string(), timeout)?);
        }
        for provider in CommunityProvider::defaults(timeout)? {
            builder = builder.provider(provider);
        }

        Ok(builder.cache(TranslationCache::from_config(config)).build())
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn chunking(&self) -> &ChunkingConfig {
        &self.chunking
    }

    /// Translate with cache, provider fallback and chunking as needed
    pub async fn translate(&self, request: &TranslationRequest) -> TranslationOutcome {
        let text = request.text.as_str();
        let Some(target) = self.resolve_target(request) else {
            return TranslationOutcome::fallback(text);
        };
        if let Some(done) = self.short_circuit(request, target) {
            return done;
        }

        let source = request.source_language.as_str();
        let target = target.code();

        if let Some(cached) = self.cache.get(target, text) {
            debug!("Translation served from cache");
            return TranslationOutcome::cached(cached);
        }

        if self.chunking.is_long(text) {
            debug!(
                "Content is long ({} chars), using chunked translation",
                text.chars().count()
            );
            let plan = ChunkPlan::build(text, &self.chunking);
            return self.translate_chunked(&plan, text, target, source).await;
        }

        let direct = self.translate_uncached(text, target, source).await;
        if direct.success || !self.chunking.exceeds_chunk(text) {
            return direct;
        }

        debug!("Direct translation failed, falling back to chunked");
        let plan = ChunkPlan::by_paragraphs(text, self.chunking.chunk_size);
        self.translate_chunked(&plan, text, target, source).await
    }

    /// Translated text, or the original when translation is unavailable
    pub async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
    ) -> String {
        let request = TranslationRequest::new(text, target_language)
            .with_source(source_language.unwrap_or(AUTO_LOCALE));
        self.translate(&request).await.text
    }

    /// Paragraph → sentence → word chunked translation regardless of length
    pub async fn translate_long_content(&self, content: &str, target_language: &str) -> String {
        let request = TranslationRequest::new(content, target_language);
        let Some(target) = self.resolve_target(&request) else {
            return content.to_string();
        };
        if let Some(done) = self.short_circuit(&request, target) {
            return done.text;
        }

        let target = target.code();
        if let Some(cached) = self.cache.get(target, content) {
            return cached;
        }

        let plan = ChunkPlan::by_paragraphs(content, self.chunking.chunk_size);
        info!(
            "Split long content into {} paragraphs, {} chunks",
            plan.paragraph_count(),
            plan.chunk_count()
        );
        self.translate_chunked(&plan, content, target, AUTO_LOCALE)
            .await
            .text
    }

    /// Blog bodies: long posts go straight to chunked mode, medium posts try a
    /// direct call first, short posts are translated directly.
    pub async fn translate_blog_post(
        &self,
        content: &str,
        target_language: &str,
    ) -> TranslationOutcome {
        info!(
            "Translating blog post to {}, content length: {}",
            target_language,
            content.chars().count()
        );
        let outcome = self
            .translate(&TranslationRequest::new(content, target_language))
            .await;
        if outcome.success {
            info!("Blog post translation completed via {}", outcome.method);
        }
        outcome
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cleanup_cache(&self) -> usize {
        self.cache.cleanup()
    }

    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    /// Run a translation and describe what happened
    pub async fn test_translation(&self, text: &str, target_language: &str) -> TranslationTestReport {
        let outcome = self
            .translate(&TranslationRequest::new(text, target_language))
            .await;
        let changed = outcome.success && outcome.text != text;

        TranslationTestReport {
            success: changed,
            original_text: text.to_string(),
            method: outcome.method.method_name().to_string(),
            error: (!changed).then(|| "Translation returned same text".to_string()),
            translated_text: outcome.text,
        }
    }

    /// Try every provider with a short en→ko translation
    pub async fn check_provider_status(&self) -> ProviderStatusReport {
        let premium = match &self.premium {
            Some(provider) => match self.check_provider(provider.as_ref()).await {
                Ok(()) => ProviderStatus {
                    available: true,
                    error: None,
                },
                Err(e) => ProviderStatus {
                    available: false,
                    error: Some(e.to_string()),
                },
            },
            None => ProviderStatus {
                available: false,
                error: Some("No API key configured".to_string()),
            },
        };

        let mut free = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let result = self.check_provider(provider.as_ref()).await;
            free.push(NamedProviderStatus {
                name: provider.provider_name().to_string(),
                available: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            });
        }

        ProviderStatusReport { premium, free }
    }

    /// Every provider the service knows about, premium first
    pub fn available_methods(&self) -> Vec<MethodInfo> {
        let mut methods = vec![MethodInfo {
            name: self
                .premium
                .as_ref()
                .map(|p| p.provider_name().to_string())
                .unwrap_or_else(|| GoogleTranslateProvider::NAME.to_string()),
            tier: ProviderTier::Premium,
            configured: self.premium.is_some(),
        }];
        methods.extend(self.providers.iter().map(|p| MethodInfo {
            name: p.provider_name().to_string(),
            tier: ProviderTier::Free,
            configured: true,
        }));
        methods
    }

    /// Sweep expired cache entries every `cleanup_interval` until aborted
    pub fn spawn_periodic_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let period = self.cleanup_interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                service.cleanup_cache();
            }
        })
    }

    fn resolve_target(&self, request: &TranslationRequest) -> Option<Language> {
        match request.target_language.parse::<Language>() {
            Ok(language) => Some(language),
            Err(e) => {
                warn!("{}", MtError::from(e));
                None
            }
        }
    }

    fn short_circuit(
        &self,
        request: &TranslationRequest,
        target: Language,
    ) -> Option<TranslationOutcome> {
        let same_language = request.source_language != AUTO_LOCALE
            && normalize_locale(&request.source_language) == target.code();
        if target.is_default() || same_language || request.text.trim().is_empty() {
            return Some(TranslationOutcome::passthrough(&request.text));
        }
        None
    }

    /// Cache check plus sequential provider attempts, no chunking
    async fn translate_segment(&self, text: &str, target: &str, source: &str) -> TranslationOutcome {
        if let Some(cached) = self.cache.get(target, text) {
            return TranslationOutcome::cached(cached);
        }
        self.translate_uncached(text, target, source).await
    }

    async fn translate_uncached(&self, text: &str, target: &str, source: &str) -> TranslationOutcome {
        match self.attempt_providers(text, target, source).await {
            Ok((translated, provider)) => {
                self.cache.put(target, text, &translated);
                info!("Translation completed successfully via {}", provider);
                TranslationOutcome {
                    success: true,
                    text: translated,
                    method: TranslationMethod::Provider(provider),
                }
            }
            Err(e) => {
                warn!("{}, returning original text", e);
                TranslationOutcome::fallback(text)
            }
        }
    }

    /// Premium first, then free providers in order; first distinct, non-empty result wins
    async fn attempt_providers(
        &self,
        text: &str,
        target: &str,
        source: &str,
    ) -> MtResult<(String, String)> {
        let mut attempts = 0;

        for provider in self.premium.iter().chain(self.providers.iter()) {
            let name = provider.provider_name();
            attempts += 1;
            debug!("Trying {} ({} → {})", name, source, target);

            let result =
                tokio::time::timeout(self.request_timeout, provider.translate(text, source, target))
                    .await
                    .unwrap_or(Err(MtError::Timeout(self.request_timeout)));

            match result {
                Ok(translated) if is_new_translation(text, &translated) => {
                    return Ok((translated, name.to_string()));
                }
                Ok(_) => debug!("{} returned identical text, trying next provider", name),
                Err(e) if e.is_provider_failure() => warn!("{} failed: {}", name, e),
                Err(e) => warn!("{} cannot serve this request, skipping: {}", name, e),
            }
        }

        Err(MtError::AllProvidersExhausted { attempts })
    }

    /// One short en→ko translation; the text itself is discarded
    async fn check_provider(&self, provider: &dyn MachineTranslator) -> MtResult<()> {
        let translated = tokio::time::timeout(
            self.request_timeout,
            provider.translate(STATUS_CHECK_TEXT, Language::En.code(), Language::Ko.code()),
        )
        .await
        .unwrap_or(Err(MtError::Timeout(self.request_timeout)))?;

        if !is_new_translation(STATUS_CHECK_TEXT, &translated) {
            return Err(MtError::UnchangedText);
        }
        Ok(())
    }

    /// Translate every chunk concurrently and reassemble in order.
    ///
    /// Failed chunks keep their original text. The result is cached only when
    /// every chunk translated.
    async fn translate_chunked(
        &self,
        plan: &ChunkPlan,
        original: &str,
        target: &str,
        source: &str,
    ) -> TranslationOutcome {
        let chunks = plan.chunks();
        debug!("Split content into {} chunks", chunks.len());

        let outcomes = join_all(
            chunks
                .iter()
                .map(|chunk| self.translate_segment(chunk, target, source)),
        )
        .await;

        let translated = outcomes.iter().filter(|o| o.success).count();
        if translated == 0 {
            warn!(
                "{}, returning original text",
                MtError::AllProvidersExhausted {
                    attempts: self.provider_count()
                }
            );
            return TranslationOutcome::fallback(original);
        }
        if translated < chunks.len() {
            warn!(
                "{} of {} chunks kept their original text",
                chunks.len() - translated,
                chunks.len()
            );
        }

        let texts: Vec<String> = outcomes.into_iter().map(|o| o.text).collect();
        let text = plan.reassemble(&texts);
        if translated == chunks.len() {
            self.cache.put(target, original, &text);
        }

        TranslationOutcome {
            success: true,
            text,
            method: TranslationMethod::Chunked,
        }
    }

    fn provider_count(&self) -> usize {
        self.providers.len() + usize::from(self.premium.is_some())
    }
}

fn is_new_translation(input: &str, output: &str) -> bool {
    let output = output.trim();
    !output.is_empty() && output != input.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::mock::{MockMode, MockTranslator};
    use std::collections::HashMap;

    fn failing(name: &str, priority: u32) -> MockTranslator {
        MockTranslator::named(name, MockMode::Error(format!("{} down", name))).with_priority(priority)
    }

    fn suffixing(name: &str, priority: u32) -> MockTranslator {
        MockTranslator::named(name, MockMode::Suffix).with_priority(priority)
    }

    // ========== Passthrough Tests ==========

    #[tokio::test]
    async fn test_default_language_is_passthrough() {
        let mock = suffixing("p1", 1);
        let service = TranslationService::builder().provider(mock.clone()).build();

        let outcome = service
            .translate(&TranslationRequest::new("Hello", "en"))
            .await;
        assert_eq!(outcome, TranslationOutcome::passthrough("Hello"));
        assert_eq!(mock.call_count(), 0);
        assert_eq!(service.cache_stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_same_source_and_target_is_passthrough() {
        let mock = suffixing("p1", 1);
        let service = TranslationService::builder().provider(mock.clone()).build();

        let request = TranslationRequest::new("안녕", "ko").with_source("ko-KR");
        let outcome = service.translate(&request).await;
        assert_eq!(outcome.method, TranslationMethod::Passthrough);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_text_is_passthrough() {
        let mock = suffixing("p1", 1);
        let service = TranslationService::builder().provider(mock.clone()).build();
        assert_eq!(service.translate_text("  ", "ko", None).await, "  ");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_language_echoes_input() {
        let mock = suffixing("p1", 1);
        let service = TranslationService::builder().provider(mock.clone()).build();

        let outcome = service
            .translate(&TranslationRequest::new("Hello", "fr"))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.text, "Hello");
        assert_eq!(outcome.method, TranslationMethod::Fallback);
        assert_eq!(mock.call_count(), 0);
    }

    // ========== Provider Order Tests ==========

    #[tokio::test]
    async fn test_premium_tried_before_free() {
        let premium = suffixing("premium", 1);
        let free = suffixing("free", 2);
        let service = TranslationService::builder()
            .premium(premium.clone())
            .provider(free.clone())
            .build();

        let outcome = service
            .translate(&TranslationRequest::new("Hello", "ko"))
            .await;
        assert_eq!(outcome.method, TranslationMethod::Provider("premium".to_string()));
        assert_eq!(free.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_premium_falls_back_to_free() {
        let premium = failing("premium", 1);
        let free = suffixing("free", 2);
        let service = TranslationService::builder()
            .premium(premium.clone())
            .provider(free.clone())
            .build();

        let outcome = service
            .translate(&TranslationRequest::new("Hello", "zh"))
            .await;
        assert_eq!(outcome.text, "Hello_zh");
        assert_eq!(premium.call_count(), 1);
        assert_eq!(free.call_count(), 1);
    }

    #[tokio::test]
    async fn test_providers_sorted_by_priority() {
        let late = suffixing("late", 9);
        let early = suffixing("early", 2);
        let service = TranslationService::builder()
            .provider(late.clone())
            .provider(early.clone())
            .build();

        let outcome = service
            .translate(&TranslationRequest::new("Hello", "ko"))
            .await;
        assert_eq!(outcome.method.method_name(), "early");
        assert_eq!(late.call_count(), 0);
    }

    #[tokio::test]
    async fn test_echoing_provider_is_skipped() {
        let echo = MockTranslator::named("echo", MockMode::NoOp).with_priority(1);
        let real = suffixing("real", 2);
        let service = TranslationService::builder()
            .provider(echo.clone())
            .provider(real.clone())
            .build();

        let outcome = service
            .translate(&TranslationRequest::new("Hello", "ko"))
            .await;
        assert_eq!(outcome.text, "Hello_ko");
        assert_eq!(echo.call_count(), 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let slow = MockTranslator::named("slow", MockMode::Suffix)
            .with_priority(1)
            .delay(200);
        let fast = suffixing("fast", 2);
        // Config timeouts are whole seconds; shrink it directly
        let service = TranslationService {
            request_timeout: Duration::from_millis(20),
            ..TranslationService::builder()
                .provider(slow.clone())
                .provider(fast.clone())
                .build()
        };

        let outcome = service
            .translate(&TranslationRequest::new("Hello", "ko"))
            .await;
        assert_eq!(outcome.method.method_name(), "fast");
        assert_eq!(slow.call_count(), 1);
    }

    // ========== Cache Tests ==========

    #[tokio::test]
    async fn test_success_is_cached() {
        let mock = suffixing("p1", 1);
        let service = TranslationService::builder().provider(mock.clone()).build();

        let first = service
            .translate(&TranslationRequest::new("Hello", "ko"))
            .await;
        let second = service
            .translate(&TranslationRequest::new("Hello", "ko"))
            .await;

        assert_eq!(first.text, second.text);
        assert_eq!(second.method, TranslationMethod::Cache);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let mock = failing("p1", 1);
        let service = TranslationService::builder().provider(mock.clone()).build();

        service.translate_text("Hello", "ko", None).await;
        service.translate_text("Hello", "ko", None).await;
        assert_eq!(mock.call_count(), 2);
        assert_eq!(service.cache_stats().total_entries, 0);
    }

    // ========== Chunking Tests ==========

    fn small_chunks() -> TranslationConfig {
        TranslationConfig {
            chunk_size: 10,
            long_content_threshold: 40,
            ..TranslationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_medium_text_tries_direct_first() {
        let mock = MockTranslator::named("upper", MockMode::Uppercase);
        let service = TranslationService::builder()
            .config(small_chunks())
            .provider(mock.clone())
            .build();

        let outcome = service
            .translate(&TranslationRequest::new("First one. Second one.", "ko"))
            .await;
        assert_eq!(outcome.text, "FIRST ONE. SECOND ONE.");
        assert_eq!(outcome.method.method_name(), "upper");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_medium_text_chunks_after_direct_failure() {
        let text = "First one. Second one.";
        let mut map = HashMap::new();
        map.insert(("First one.".to_string(), "ko".to_string()), "첫째.".to_string());
        map.insert(("Second one.".to_string(), "ko".to_string()), "둘째.".to_string());
        // The whole text maps to itself, so the direct attempt is an echo
        map.insert((text.to_string(), "ko".to_string()), text.to_string());
        let mock = MockTranslator::new(MockMode::Mappings(map));

        let service = TranslationService::builder()
            .config(TranslationConfig {
                chunk_size: 12,
                ..small_chunks()
            })
            .provider(mock.clone())
            .build();

        let outcome = service.translate(&TranslationRequest::new(text, "ko")).await;
        assert!(outcome.success);
        assert_eq!(outcome.method, TranslationMethod::Chunked);
        assert_eq!(outcome.text, "첫째. 둘째.");
        assert_eq!(mock.call_count(), 3);
        assert_eq!(service.cache().get("ko", text), Some("첫째. 둘째.".to_string()));
    }

    #[tokio::test]
    async fn test_chunked_retry_keeps_paragraph_breaks() {
        let text = "First one.\n\nSecond one.";
        let mut map = HashMap::new();
        map.insert((text.to_string(), "ko".to_string()), text.to_string());
        let mock = MockTranslator::new(MockMode::Mappings(map));

        let service = TranslationService::builder()
            .config(TranslationConfig {
                chunk_size: 12,
                ..small_chunks()
            })
            .provider(mock.clone())
            .build();

        let outcome = service.translate(&TranslationRequest::new(text, "ko")).await;
        assert_eq!(outcome.method, TranslationMethod::Chunked);
        assert_eq!(outcome.text, "First one._ko\n\nSecond one._ko");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_long_text_skips_direct_attempt() {
        let mock = MockTranslator::named("upper", MockMode::Uppercase);
        let service = TranslationService::builder()
            .config(TranslationConfig {
                chunk_size: 30,
                long_content_threshold: 40,
                ..TranslationConfig::default()
            })
            .provider(mock.clone())
            .build();

        let content = "Paragraph one is here.\n\nParagraph two is here.";
        let outcome = service.translate(&TranslationRequest::new(content, "zh")).await;
        assert_eq!(outcome.method, TranslationMethod::Chunked);
        assert_eq!(outcome.text, "PARAGRAPH ONE IS HERE.\n\nPARAGRAPH TWO IS HERE.");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_partial_chunk_failure_keeps_originals_and_skips_cache() {
        let mut map = HashMap::new();
        map.insert(("Alpha.".to_string(), "ko".to_string()), "알파.".to_string());
        map.insert(("Beta.".to_string(), "ko".to_string()), "Beta.".to_string());
        let mock = MockTranslator::new(MockMode::Mappings(map));
        let service = TranslationService::builder()
            .config(TranslationConfig {
                chunk_size: 6,
                long_content_threshold: 10,
                ..TranslationConfig::default()
            })
            .provider(mock)
            .build();

        let content = "Alpha. Beta.";
        let outcome = service.translate(&TranslationRequest::new(content, "ko")).await;
        assert!(outcome.success);
        assert_eq!(outcome.text, "알파. Beta.");
        assert_eq!(service.cache().get("ko", content), None);
        // The chunk that worked is cached on its own
        assert_eq!(service.cache().get("ko", "Alpha."), Some("알파.".to_string()));
    }

    #[tokio::test]
    async fn test_all_chunks_failing_is_fallback() {
        let service = TranslationService::builder()
            .config(small_chunks())
            .provider(failing("p1", 1))
            .build();

        let content = "One sentence here. Another sentence here. And a third one to be long.";
        let outcome = service.translate(&TranslationRequest::new(content, "ko")).await;
        assert!(!outcome.success);
        assert_eq!(outcome.text, content);
    }

    #[tokio::test]
    async fn test_translate_long_content_forces_paragraphs() {
        let mock = MockTranslator::named("upper", MockMode::Uppercase);
        let service = TranslationService::builder().provider(mock.clone()).build();

        let content = "Short one.\n\nShort two.";
        let result = service.translate_long_content(content, "ko").await;
        assert_eq!(result, "SHORT ONE.\n\nSHORT TWO.");
        assert_eq!(mock.call_count(), 2);

        // Second call is served from cache
        assert_eq!(service.translate_long_content(content, "ko").await, result);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_translate_long_content_default_language() {
        let mock = suffixing("p1", 1);
        let service = TranslationService::builder().provider(mock.clone()).build();
        assert_eq!(service.translate_long_content("A.\n\nB.", "en").await, "A.\n\nB.");
        assert_eq!(mock.call_count(), 0);
    }

    // ========== Diagnostics Tests ==========

    #[tokio::test]
    async fn test_provider_status_report() {
        let service = TranslationService::builder()
            .provider(suffixing("up", 1))
            .provider(failing("down", 2))
            .build();

        let report = service.check_provider_status().await;
        assert!(!report.premium.available);
        assert_eq!(report.premium.error.as_deref(), Some("No API key configured"));
        assert_eq!(report.free.len(), 2);
        assert!(report.free[0].available);
        assert_eq!(report.free[1].name, "down");
        assert!(!report.free[1].available);
        assert!(report.free[1].error.as_deref().unwrap().contains("down down"));
    }

    #[tokio::test]
    async fn test_provider_status_translates_hello_into_korean() {
        let mut echo_map = HashMap::new();
        echo_map.insert(("Hello".to_string(), "ko".to_string()), "Hello".to_string());
        let echo = MockTranslator::named("echo", MockMode::Mappings(echo_map)).with_priority(1);

        let mut real_map = HashMap::new();
        real_map.insert(("Hello".to_string(), "ko".to_string()), "안녕하세요".to_string());
        let real = MockTranslator::named("real", MockMode::Mappings(real_map)).with_priority(2);

        let service = TranslationService::builder()
            .provider(echo.clone())
            .provider(real.clone())
            .build();
        let report = service.check_provider_status().await;

        assert!(!report.free[0].available);
        assert_eq!(
            report.free[0].error.as_deref(),
            Some("Provider returned the input unchanged")
        );
        assert!(report.free[1].available);
        assert_eq!(echo.call_count(), 1);
        assert_eq!(real.call_count(), 1);
        // Status checks never touch the cache
        assert_eq!(service.cache_stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_provider_status_reports_timeout() {
        let slow = MockTranslator::named("slow", MockMode::Suffix).delay(200);
        let service = TranslationService {
            request_timeout: Duration::from_millis(20),
            ..TranslationService::builder().premium(slow).build()
        };

        let report = service.check_provider_status().await;
        assert!(!report.premium.available);
        assert!(report.premium.error.as_deref().unwrap().starts_with("Timed out"));
    }

    #[tokio::test]
    async fn test_provider_status_with_premium() {
        let service = TranslationService::builder()
            .premium(suffixing("premium", 1))
            .build();
        let report = service.check_provider_status().await;
        assert!(report.premium.available);
        assert!(report.free.is_empty());
    }

    #[tokio::test]
    async fn test_translation_report() {
        let service = TranslationService::builder()
            .provider(suffixing("p1", 1))
            .build();
        let report = service.test_translation("Hello", "ko").await;
        assert!(report.success);
        assert_eq!(report.translated_text, "Hello_ko");
        assert_eq!(report.method, "p1");
        assert_eq!(report.error, None);

        let failed = TranslationService::builder()
            .provider(failing("p1", 1))
            .build()
            .test_translation("Hello", "ko")
            .await;
        assert!(!failed.success);
        assert_eq!(failed.method, "fallback");
        assert_eq!(failed.error.as_deref(), Some("Translation returned same text"));
    }

    #[test]
    fn test_available_methods() {
        let service = TranslationService::builder()
            .provider(suffixing("free", 2))
            .build();
        let methods = service.available_methods();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name, "Google Translate");
        assert_eq!(methods[0].tier, ProviderTier::Premium);
        assert!(!methods[0].configured);
        assert_eq!(methods[1].tier, ProviderTier::Free);
        assert!(methods[1].configured);
    }

    #[test]
    fn test_from_config_wires_community_providers() {
        let config = TranslationConfig {
            use_memory_cache: true,
            ..TranslationConfig::default()
        };
        let service = TranslationService::from_config(&config).unwrap();
        let names: Vec<String> = service
            .available_methods()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "Google Translate",
                "LibreTranslate",
                "MyMemory",
                "LingvaTranslate",
                "TranslateAPI"
            ]
        );
    }

    #[test]
    fn test_from_config_blank_key_skips_premium() {
        let config = TranslationConfig {
            google_api_key: Some("   ".to_string()),
            use_memory_cache: true,
            ..TranslationConfig::default()
        };
        let service = TranslationService::from_config(&config).unwrap();
        let methods = service.available_methods();
        assert!(!methods[0].configured);
        assert_eq!(methods.len(), 5);
    }

    #[test]
    fn test_from_config_with_key_enables_premium() {
        let config = TranslationConfig {
            google_api_key: Some("key".to_string()),
            use_memory_cache: true,
            ..TranslationConfig::default()
        };
        let service = TranslationService::from_config(&config).unwrap();
        assert!(service.available_methods()[0].configured);
    }

    #[tokio::test]
    async fn test_periodic_cleanup_removes_expired_entries() {
        use crate::mt::cache::CacheEntry;

        let service = Arc::new(TranslationService {
            cleanup_interval: Duration::from_millis(10),
            ..TranslationService::builder().build()
        });
        service.cache().put("ko", "fresh", "신선한");
        service.cache().insert_entry(&CacheEntry::new(
            "ko",
            "old",
            "낡은",
            chrono::Utc::now() - chrono::Duration::days(31),
            chrono::Duration::days(30),
        ));

        let handle = service.spawn_periodic_cleanup();
        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.abort();

        // Only the fresh entry survives the sweep
        assert_eq!(service.cache().clear(), 1);
    }
}
