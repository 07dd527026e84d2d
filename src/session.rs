//! Per-visitor language state
//!
//! A [`LanguageSession`] holds the visitor's chosen language, answers static
//! dictionary lookups, and routes dynamic text through the shared
//! [`TranslationService`]. It is an ordinary value shared by `Arc`; nothing
//! here is global.
//!
//! Language switches bump a generation counter. A retranslation that finishes
//! after a newer switch is discarded instead of overwriting fresher content.

use crate::I18n;
use crate::language::Language;
use crate::mt::service::{TranslationOutcome, TranslationRequest, TranslationService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info};

/// Immutable view of the session for one render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub language: Language,
    /// True while any translation started by this session is in flight
    pub is_translating: bool,
    pub generation: u64,
}

/// Dynamic content currently on screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayedContent {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct Displayed {
    /// Authored (English) content
    source: Option<DisplayedContent>,
    /// Latest rendering in the session language
    rendered: Option<DisplayedContent>,
}

pub struct LanguageSession {
    service: Arc<TranslationService>,
    i18n: I18n,
    state: watch::Sender<SessionSnapshot>,
    in_flight: AtomicUsize,
    displayed: Mutex<Displayed>,
}

impl std::fmt::Debug for LanguageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageSession")
            .field("snapshot", &self.snapshot())
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish()
    }
}

impl LanguageSession {
    /// Start a session in the default language. Sweeps expired cache
    /// entries once.
    pub fn new(service: Arc<TranslationService>, i18n: I18n) -> Self {
        let removed = service.cleanup_cache();
        debug!("Session started, {} stale cache entries removed", removed);

        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            service,
            i18n,
            state,
            in_flight: AtomicUsize::new(0),
            displayed: Mutex::new(Displayed::default()),
        }
    }

    pub fn service(&self) -> &Arc<TranslationService> {
        &self.service
    }

    pub fn language(&self) -> Language {
        self.state.borrow().language
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        *self.state.borrow()
    }

    pub fn is_translating(&self) -> bool {
        self.state.borrow().is_translating
    }

    /// Change notifications; the receiver sees the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Static dictionary lookup in the session language; the key on a miss
    pub fn t(&self, key: &str) -> String {
        self.i18n.get_message(self.language().code(), key)
    }

    /// Translate English text into the session language
    pub async fn translate(&self, text: &str) -> TranslationOutcome {
        let target = self.language();
        let _guard = InFlight::enter(self);
        let request = TranslationRequest::new(text, target.code()).with_source(Language::En.code());
        self.service.translate(&request).await
    }

    /// Register authored content and render it in the session language
    pub async fn show_content(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> DisplayedContent {
        let source = DisplayedContent {
            title: title.into(),
            body: body.into(),
        };
        self.lock_displayed().source = Some(source.clone());

        let snapshot = self.snapshot();
        let rendered = self.render(&source, snapshot.language).await;
        if self.snapshot().generation == snapshot.generation {
            self.lock_displayed().rendered = Some(rendered.clone());
        }
        rendered
    }

    /// Latest rendering of the registered content
    pub fn displayed(&self) -> Option<DisplayedContent> {
        self.lock_displayed().rendered.clone()
    }

    /// Switch language and retranslate the registered content.
    ///
    /// Returns `None` when no content is registered, or when another switch
    /// happened before this one finished translating.
    pub async fn set_language(&self, language: Language) -> Option<DisplayedContent> {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.language = language;
            state.generation += 1;
            generation = state.generation;
        });
        info!("Language changed to {}", language);

        let source = self.lock_displayed().source.clone()?;
        let rendered = self.render(&source, language).await;

        if self.snapshot().generation != generation {
            debug!(
                "Discarding {} rendering from superseded generation {}",
                language, generation
            );
            return None;
        }
        self.lock_displayed().rendered = Some(rendered.clone());
        Some(rendered)
    }

    async fn render(&self, source: &DisplayedContent, language: Language) -> DisplayedContent {
        if language.is_default() {
            return source.clone();
        }

        let _guard = InFlight::enter(self);
        let title_request = TranslationRequest::new(source.title.as_str(), language.code())
            .with_source(Language::En.code());
        let (title, body) = tokio::join!(
            self.service.translate(&title_request),
            self.service.translate_blog_post(&source.body, language.code()),
        );

        DisplayedContent {
            title: title.text,
            body: body.text,
        }
    }

    fn lock_displayed(&self) -> MutexGuard<'_, Displayed> {
        self.displayed.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn refresh_translating(&self) {
        // Read the counter under the watch lock so concurrent guards serialize
        self.state.send_modify(|state| {
            state.is_translating = self.in_flight.load(Ordering::SeqCst) > 0;
        });
    }
}

/// Marks a translation in flight until dropped, including on cancellation
struct InFlight<'a> {
    session: &'a LanguageSession,
}

impl<'a> InFlight<'a> {
    fn enter(session: &'a LanguageSession) -> Self {
        session.in_flight.fetch_add(1, Ordering::SeqCst);
        session.refresh_translating();
        Self { session }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.session.refresh_translating();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::mock::{MockMode, MockTranslator};
    use crate::mt::service::TranslationMethod;
    use std::collections::HashMap;
    use std::time::Duration;

    fn session_with(mock: MockTranslator) -> Arc<LanguageSession> {
        let service = Arc::new(TranslationService::builder().provider(mock).build());
        let i18n = I18n::with_builtin_messages().unwrap();
        Arc::new(LanguageSession::new(service, i18n))
    }

    // ========== Dictionary Tests ==========

    #[tokio::test]
    async fn test_t_follows_language() {
        let session = session_with(MockTranslator::new(MockMode::Suffix));
        assert_eq!(session.t("nav.blog"), "Blog");

        session.set_language(Language::Ko).await;
        assert_eq!(session.t("nav.blog"), "블로그");
        assert_eq!(session.t("missing.key"), "missing.key");
    }

    // ========== Translation Tests ==========

    #[tokio::test]
    async fn test_translate_in_default_language_is_passthrough() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let session = session_with(mock.clone());

        let outcome = session.translate("Hello").await;
        assert_eq!(outcome.method, TranslationMethod::Passthrough);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_translate_uses_session_language() {
        let session = session_with(MockTranslator::new(MockMode::Suffix));
        session.set_language(Language::Zh).await;

        let outcome = session.translate("Hello").await;
        assert_eq!(outcome.text, "Hello_zh");
        assert!(!session.is_translating());
    }

    #[tokio::test]
    async fn test_is_translating_cleared_when_cancelled() {
        let mock = MockTranslator::new(MockMode::Suffix).delay(200);
        let session = session_with(mock);
        session.set_language(Language::Ko).await;

        let worker = Arc::clone(&session);
        let handle = tokio::spawn(async move { worker.translate("Hello").await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(session.is_translating());

        handle.abort();
        let _ = handle.await;
        assert!(!session.is_translating());
    }

    // ========== Language Switch Tests ==========

    #[tokio::test]
    async fn test_set_language_bumps_generation_and_notifies() {
        let session = session_with(MockTranslator::new(MockMode::Suffix));
        let mut rx = session.subscribe();

        assert_eq!(session.set_language(Language::Ko).await, None);
        assert!(rx.has_changed().unwrap());
        let snapshot = *rx.borrow_and_update();
        assert_eq!(snapshot.language, Language::Ko);
        assert_eq!(snapshot.generation, 1);
    }

    #[tokio::test]
    async fn test_set_language_retranslates_content() {
        let session = session_with(MockTranslator::new(MockMode::Suffix));
        let shown = session.show_content("Title", "Body text.").await;
        assert_eq!(shown.title, "Title");

        let rendered = session.set_language(Language::Ko).await.unwrap();
        assert_eq!(rendered.title, "Title_ko");
        assert_eq!(rendered.body, "Body text._ko");
        assert_eq!(session.displayed(), Some(rendered));

        let back = session.set_language(Language::En).await.unwrap();
        assert_eq!(back.title, "Title");
    }

    #[tokio::test]
    async fn test_superseded_switch_is_discarded() {
        let mut map = HashMap::new();
        map.insert(("Title".to_string(), "ko".to_string()), "제목".to_string());
        map.insert(("Title".to_string(), "zh".to_string()), "标题".to_string());
        let mock = MockTranslator::new(MockMode::Mappings(map)).delay(100);
        let session = session_with(mock);
        session.show_content("Title", "Body.").await;

        let first = Arc::clone(&session);
        let slow_switch = tokio::spawn(async move { first.set_language(Language::Ko).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let latest = session.set_language(Language::Zh).await.unwrap();
        assert_eq!(latest.title, "标题");
        assert_eq!(slow_switch.await.unwrap(), None);

        assert_eq!(session.language(), Language::Zh);
        assert_eq!(session.displayed().unwrap().title, "标题");
    }
}
