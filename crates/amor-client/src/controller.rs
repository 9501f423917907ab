//! Session state for a page showing or editing the preferences.
//!
//! The controller fetches the document once, then owns the in-memory copy
//! for the rest of the session. Saves are optimistic: the merged document
//! is adopted before the request leaves, replaced by the server's
//! reconciled copy on success, and *kept* on failure so the user's edits
//! stay on screen. Saves are not serialized; several may be in flight and
//! their responses may land in any order.
//!
//! Phases: `Uninitialized → Loading → Ready ⇄ Saving`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use amor_shared::{NameDisplayPreference, PartialPreferences, Preferences, ValidationError};
use tracing::{info, warn};

use crate::api::PreferencesApi;
use crate::cache::{cached_theme, reconcile_theme, ClientCache};
use crate::error::ControllerError;
use crate::events::{ClientEvent, EventSender, Notice, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready,
    Saving,
}

/// Which page the controller drives.
///
/// The public page never shows load errors; it quietly renders defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Public,
    Dashboard,
}

#[derive(Debug)]
struct Session {
    phase: Phase,
    preferences: Option<Preferences>,
    applied_theme: Option<amor_shared::Theme>,
    saves_in_flight: usize,
}

pub struct PreferencesController<A, C> {
    api: A,
    cache: C,
    surface: Surface,
    events: EventSender,
    // Never held across an await.
    session: Mutex<Session>,
}

impl<A: PreferencesApi, C: ClientCache> PreferencesController<A, C> {
    pub fn new(api: A, cache: C, surface: Surface, events: EventSender) -> Self {
        Self {
            api,
            cache,
            surface,
            events,
            session: Mutex::new(Session {
                phase: Phase::Uninitialized,
                preferences: None,
                applied_theme: None,
                saves_in_flight: 0,
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.session().phase
    }

    /// Current in-memory document, `None` until initialized.
    pub fn preferences(&self) -> Option<Preferences> {
        self.session().preferences.clone()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Load the document from the server. Runs once per controller.
    ///
    /// The cached theme (or the default) is applied before the request so
    /// the surface does not flash the wrong theme. On failure the session
    /// continues on defaults.
    pub async fn initialize(&self) -> Result<Preferences, ControllerError> {
        let placeholder = cached_theme(&self.cache).unwrap_or_default();
        {
            let mut session = self.session();
            if session.phase != Phase::Uninitialized {
                return Err(ControllerError::AlreadyInitialized);
            }
            session.phase = Phase::Loading;
            self.apply_theme(&mut session, placeholder);
        }

        let fetched = self.api.fetch().await;

        let mut session = self.session();
        let preferences = match fetched {
            Ok(preferences) => {
                reconcile_theme(&self.cache, preferences.theme);
                info!(theme = %preferences.theme, "Preferences loaded");
                preferences
            }
            Err(e) => {
                warn!(error = %e, "Failed to load preferences, using defaults");
                if self.surface == Surface::Dashboard {
                    self.notify(
                        Severity::Warning,
                        "Erro ao Carregar Preferências",
                        format!(
                            "Não foi possível buscar as configurações do servidor. Usando padrões. Detalhe: {e}"
                        ),
                    );
                }
                Preferences {
                    theme: placeholder,
                    ..Preferences::default()
                }
            }
        };

        self.apply_theme(&mut session, preferences.theme);
        session.preferences = Some(preferences.clone());
        session.phase = Phase::Ready;
        Ok(preferences)
    }

    /// Optimistically apply `partial` and merge-write it to the server.
    ///
    /// Returns the server's reconciled document. On failure the optimistic
    /// document stays in place and an error notice is raised.
    pub async fn save(&self, partial: PartialPreferences) -> Result<Preferences, ControllerError> {
        {
            let mut session = self.session();
            let current = match (session.phase, session.preferences.clone()) {
                (Phase::Ready | Phase::Saving, Some(current)) => current,
                _ => {
                    self.notify(
                        Severity::Error,
                        "Erro ao Salvar",
                        "Preferências não carregadas. Tente recarregar a página.",
                    );
                    return Err(ControllerError::NotReady);
                }
            };
            if partial.is_empty() {
                return Err(ValidationError::Empty.into());
            }

            let optimistic = current.merged(&partial);
            self.apply_theme(&mut session, optimistic.theme);
            session.preferences = Some(optimistic);
            session.saves_in_flight += 1;
            session.phase = Phase::Saving;
        }

        let result = self.api.merge_write(&partial).await;

        let mut session = self.session();
        session.saves_in_flight = session.saves_in_flight.saturating_sub(1);
        if session.saves_in_flight == 0 {
            session.phase = Phase::Ready;
        }

        match result {
            Ok(reconciled) => {
                reconcile_theme(&self.cache, reconciled.theme);
                self.apply_theme(&mut session, reconciled.theme);
                session.preferences = Some(reconciled.clone());
                self.notify(
                    Severity::Info,
                    "Preferências Salvas!",
                    "Suas alterações foram salvas no servidor.",
                );
                Ok(reconciled)
            }
            Err(e) => {
                warn!(error = %e, "Failed to save preferences, keeping local edits");
                // Another save may have landed meanwhile; put this edit back on top.
                if let Some(reapplied) = session.preferences.as_ref().map(|p| p.merged(&partial)) {
                    self.apply_theme(&mut session, reapplied.theme);
                    session.preferences = Some(reapplied);
                }
                self.notify(
                    Severity::Error,
                    "Erro ao Salvar no Servidor",
                    format!("Não foi possível salvar suas alterações no servidor: {e}"),
                );
                Err(ControllerError::Save(e))
            }
        }
    }

    /// Switch between light and dark.
    pub async fn toggle_theme(&self) -> Result<Preferences, ControllerError> {
        let current = self
            .session()
            .preferences
            .as_ref()
            .map(|p| p.theme)
            .unwrap_or_default();
        self.save(PartialPreferences::default().theme(current.opposite()))
            .await
    }

    /// Save the couple's names together with how the heading shows them.
    /// Names are trimmed; an empty name is refused before any request.
    pub async fn save_names(
        &self,
        first: &str,
        second: &str,
        display: NameDisplayPreference,
    ) -> Result<Preferences, ControllerError> {
        let (first, second) = (first.trim(), second.trim());
        if first.is_empty() || second.is_empty() {
            self.notify(
                Severity::Warning,
                "Erro de Validação",
                "Os nomes do casal não podem estar vazios.",
            );
            return Err(ControllerError::EmptyName);
        }

        self.save(
            PartialPreferences::default()
                .couple_names([first.to_string(), second.to_string()])
                .name_display_preference(display),
        )
        .await
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_theme(&self, session: &mut Session, theme: amor_shared::Theme) {
        if session.applied_theme != Some(theme) {
            session.applied_theme = Some(theme);
            self.emit(ClientEvent::ThemeApplied(theme));
        }
    }

    fn notify(&self, severity: Severity, title: &str, description: impl Into<String>) {
        self.emit(ClientEvent::Notice(Notice {
            severity,
            title: title.to_string(),
            description: description.into(),
        }));
    }

    fn emit(&self, event: ClientEvent) {
        if let Err(e) = self.events.send(event) {
            warn!(event = ?e.0, "Failed to emit event, no receiver");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::ClientError;
    use crate::events::{self, EventReceiver};
    use amor_shared::constants::THEME_CACHE_KEY;
    use amor_shared::Theme;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Semaphore;

    /// Server stand-in applying the shared merge policy to an in-memory
    /// document.
    #[derive(Default)]
    struct FakeApi {
        document: Mutex<Preferences>,
        fail_fetch: AtomicBool,
        fail_writes: AtomicBool,
        writes: Mutex<Vec<PartialPreferences>>,
        gate: Option<Semaphore>,
    }

    impl FakeApi {
        fn serving(document: Preferences) -> Self {
            Self {
                document: Mutex::new(document),
                ..Self::default()
            }
        }

        fn gated(document: Preferences) -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::serving(document)
            }
        }

        fn release(&self, permits: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(permits);
            }
        }

        fn writes(&self) -> Vec<PartialPreferences> {
            self.writes.lock().unwrap().clone()
        }

        fn unavailable() -> ClientError {
            ClientError::Rejected {
                status: 503,
                message: "unavailable".to_string(),
            }
        }
    }

    impl PreferencesApi for FakeApi {
        async fn fetch(&self) -> Result<Preferences, ClientError> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(Self::unavailable());
            }
            Ok(self.document.lock().unwrap().clone())
        }

        async fn merge_write(
            &self,
            partial: &PartialPreferences,
        ) -> Result<Preferences, ClientError> {
            self.writes.lock().unwrap().push(partial.clone());
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Self::unavailable());
            }
            let mut document = self.document.lock().unwrap();
            *document = document.merged(partial);
            Ok(document.clone())
        }
    }

    type TestController = PreferencesController<FakeApi, MemoryCache>;

    fn controller(api: FakeApi, cache: MemoryCache, surface: Surface) -> (TestController, EventReceiver) {
        let (tx, rx) = events::channel();
        (PreferencesController::new(api, cache, surface, tx), rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<ClientEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    fn notices(events: &[ClientEvent]) -> Vec<&Notice> {
        events
            .iter()
            .filter_map(|e| match e {
                ClientEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn themes(events: &[ClientEvent]) -> Vec<Theme> {
        events
            .iter()
            .filter_map(|e| match e {
                ClientEvent::ThemeApplied(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    fn dark_document() -> Preferences {
        Preferences {
            theme: Theme::Dark,
            couple_names: ["Ana".into(), "Bruno".into()],
            ..Preferences::default()
        }
    }

    #[tokio::test]
    async fn initialize_adopts_server_document_and_syncs_cache() {
        let (controller, mut rx) = controller(
            FakeApi::serving(dark_document()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        assert_eq!(controller.phase(), Phase::Uninitialized);

        let prefs = controller.initialize().await.unwrap();

        assert_eq!(prefs, dark_document());
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(cached_theme(controller.cache()), Some(Theme::Dark));

        let events = drain(&mut rx);
        assert_eq!(themes(&events), vec![Theme::Light, Theme::Dark]);
        assert!(notices(&events).is_empty());
    }

    #[tokio::test]
    async fn cached_theme_is_applied_before_the_fetch() {
        let (controller, mut rx) = controller(
            FakeApi::serving(dark_document()),
            MemoryCache::with_entry(THEME_CACHE_KEY, "\"dark\""),
            Surface::Public,
        );

        controller.initialize().await.unwrap();

        // Already dark from the cache, so no second repaint.
        assert_eq!(themes(&drain(&mut rx)), vec![Theme::Dark]);
    }

    #[tokio::test]
    async fn fetched_theme_overrides_cached_theme() {
        let (controller, mut rx) = controller(
            FakeApi::serving(Preferences::default()),
            MemoryCache::with_entry(THEME_CACHE_KEY, "\"dark\""),
            Surface::Public,
        );

        controller.initialize().await.unwrap();

        assert_eq!(themes(&drain(&mut rx)), vec![Theme::Dark, Theme::Light]);
        assert_eq!(cached_theme(controller.cache()), Some(Theme::Light));
    }

    #[tokio::test]
    async fn failed_load_warns_on_dashboard_and_keeps_cached_theme() {
        let api = FakeApi::serving(dark_document());
        api.fail_fetch.store(true, Ordering::SeqCst);
        let (controller, mut rx) = controller(
            api,
            MemoryCache::with_entry(THEME_CACHE_KEY, "\"dark\""),
            Surface::Dashboard,
        );

        let prefs = controller.initialize().await.unwrap();

        assert_eq!(
            prefs,
            Preferences {
                theme: Theme::Dark,
                ..Preferences::default()
            }
        );
        assert_eq!(controller.phase(), Phase::Ready);

        let events = drain(&mut rx);
        let notices = notices(&events);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Warning);
        assert_eq!(themes(&events), vec![Theme::Dark]);
    }

    #[tokio::test]
    async fn failed_load_is_silent_on_public_page() {
        let api = FakeApi::serving(dark_document());
        api.fail_fetch.store(true, Ordering::SeqCst);
        let (controller, mut rx) = controller(api, MemoryCache::new(), Surface::Public);

        let prefs = controller.initialize().await.unwrap();

        assert_eq!(prefs, Preferences::default());
        assert!(notices(&drain(&mut rx)).is_empty());
    }

    #[tokio::test]
    async fn initialize_runs_once() {
        let (controller, _rx) = controller(
            FakeApi::serving(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();
        assert!(matches!(
            controller.initialize().await,
            Err(ControllerError::AlreadyInitialized)
        ));
    }

    #[tokio::test]
    async fn save_before_load_is_refused() {
        let (controller, mut rx) = controller(
            FakeApi::serving(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );

        let result = controller
            .save(PartialPreferences::default().theme(Theme::Dark))
            .await;

        assert!(matches!(result, Err(ControllerError::NotReady)));
        assert!(controller.api().writes().is_empty());
        assert_eq!(notices(&drain(&mut rx))[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn empty_save_is_refused() {
        let (controller, _rx) = controller(
            FakeApi::serving(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();

        let result = controller.save(PartialPreferences::default()).await;
        assert!(matches!(
            result,
            Err(ControllerError::Validation(ValidationError::Empty))
        ));
        assert_eq!(controller.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn successful_save_adopts_reconciled_document() {
        let (controller, mut rx) = controller(
            FakeApi::serving(dark_document()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();
        drain(&mut rx);

        let saved = controller
            .save(PartialPreferences::default().playlist_url(Some("X".into())))
            .await
            .unwrap();

        assert_eq!(saved.playlist_url.as_deref(), Some("X"));
        assert_eq!(saved.couple_names, dark_document().couple_names);
        assert_eq!(controller.preferences(), Some(saved));
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.api().writes().len(), 1);

        let events = drain(&mut rx);
        assert_eq!(notices(&events)[0].severity, Severity::Info);
    }

    #[tokio::test]
    async fn failed_save_keeps_the_users_edit() {
        let api = FakeApi::serving(dark_document());
        api.fail_writes.store(true, Ordering::SeqCst);
        let (controller, mut rx) = controller(api, MemoryCache::new(), Surface::Dashboard);
        controller.initialize().await.unwrap();
        drain(&mut rx);

        let result = controller
            .save(PartialPreferences::default().playlist_url(Some("X".into())))
            .await;

        assert!(matches!(result, Err(ControllerError::Save(_))));
        let visible = controller.preferences().unwrap();
        assert_eq!(visible.playlist_url.as_deref(), Some("X"));
        assert_eq!(visible.couple_names, dark_document().couple_names);
        assert_eq!(controller.phase(), Phase::Ready);

        let events = drain(&mut rx);
        let notices = notices(&events);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Error);
        assert_eq!(notices[0].title, "Erro ao Salvar no Servidor");
    }

    #[tokio::test]
    async fn optimistic_state_mirrors_server_fallbacks() {
        let (controller, _rx) = controller(
            FakeApi::serving(dark_document()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();
        controller.api().fail_writes.store(true, Ordering::SeqCst);

        let partial: PartialPreferences =
            serde_json::from_value(serde_json::json!({ "theme": "purple", "coupleNames": ["Solo"] }))
                .unwrap();
        let _ = controller.save(partial).await;

        let visible = controller.preferences().unwrap();
        assert_eq!(visible.theme, Theme::Light);
        assert_eq!(visible.couple_names, Preferences::default().couple_names);
    }

    #[tokio::test]
    async fn toggle_theme_flips_and_caches() {
        let (controller, mut rx) = controller(
            FakeApi::serving(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();
        drain(&mut rx);

        let prefs = controller.toggle_theme().await.unwrap();

        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(cached_theme(controller.cache()), Some(Theme::Dark));
        assert_eq!(themes(&drain(&mut rx)), vec![Theme::Dark]);
    }

    #[tokio::test]
    async fn failed_toggle_keeps_new_theme_on_screen_but_not_in_cache() {
        let (controller, mut rx) = controller(
            FakeApi::serving(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();
        drain(&mut rx);
        controller.api().fail_writes.store(true, Ordering::SeqCst);

        assert!(controller.toggle_theme().await.is_err());

        assert_eq!(controller.preferences().unwrap().theme, Theme::Dark);
        assert_eq!(themes(&drain(&mut rx)), vec![Theme::Dark]);
        assert_eq!(cached_theme(controller.cache()), Some(Theme::Light));
    }

    #[tokio::test]
    async fn blank_names_are_refused_locally() {
        let (controller, mut rx) = controller(
            FakeApi::serving(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();
        drain(&mut rx);

        let result = controller
            .save_names("Ana", "   ", NameDisplayPreference::Both)
            .await;

        assert!(matches!(result, Err(ControllerError::EmptyName)));
        assert!(controller.api().writes().is_empty());
        assert_eq!(notices(&drain(&mut rx))[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn names_are_trimmed_before_saving() {
        let (controller, _rx) = controller(
            FakeApi::serving(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();

        let prefs = controller
            .save_names("  Ana ", "Bruno ", NameDisplayPreference::User2)
            .await
            .unwrap();

        assert_eq!(prefs.couple_names, ["Ana".to_string(), "Bruno".to_string()]);
        assert_eq!(prefs.name_display_preference, NameDisplayPreference::User2);
    }

    #[tokio::test]
    async fn edit_is_visible_while_save_is_in_flight() {
        let (controller, _rx) = controller(
            FakeApi::gated(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();

        let (saved, ()) = tokio::join!(
            controller.save(PartialPreferences::default().defining_phrase("Nós")),
            async {
                tokio::task::yield_now().await;
                assert_eq!(controller.phase(), Phase::Saving);
                assert_eq!(controller.preferences().unwrap().defining_phrase, "Nós");
                controller.api().release(1);
            }
        );

        assert_eq!(saved.unwrap().defining_phrase, "Nós");
        assert_eq!(controller.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn failed_save_survives_an_earlier_success_landing_first() {
        let (controller, mut rx) = controller(
            FakeApi::gated(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();
        drain(&mut rx);

        let (first, second, ()) = tokio::join!(
            controller.save(PartialPreferences::default().defining_phrase("Nós")),
            controller.save(
                PartialPreferences::default()
                    .playlist_url(Some("X".into()))
                    .theme(Theme::Dark)
            ),
            async {
                tokio::task::yield_now().await;
                assert_eq!(controller.api().writes().len(), 2);
                // Only the first write is let through while writes succeed.
                controller.api().release(1);
                while controller.api().document.lock().unwrap().defining_phrase != "Nós" {
                    tokio::task::yield_now().await;
                }
                tokio::task::yield_now().await;
                controller.api().fail_writes.store(true, Ordering::SeqCst);
                controller.api().release(1);
            }
        );

        assert_eq!(first.unwrap().defining_phrase, "Nós");
        assert!(matches!(second, Err(ControllerError::Save(_))));

        let visible = controller.preferences().unwrap();
        assert_eq!(visible.defining_phrase, "Nós");
        assert_eq!(visible.playlist_url.as_deref(), Some("X"));
        assert_eq!(visible.theme, Theme::Dark);
        assert_eq!(controller.phase(), Phase::Ready);

        let events = drain(&mut rx);
        assert_eq!(themes(&events).last(), Some(&Theme::Dark));
        let severities: Vec<_> = notices(&events).iter().map(|n| n.severity).collect();
        assert!(severities.contains(&Severity::Info));
        assert!(severities.contains(&Severity::Error));
    }

    #[tokio::test]
    async fn saving_with_no_event_receiver_still_works() {
        let (controller, rx) = controller(
            FakeApi::serving(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        drop(rx);

        controller.initialize().await.unwrap();
        let prefs = controller.toggle_theme().await.unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn concurrent_saves_are_not_serialized() {
        let (controller, _rx) = controller(
            FakeApi::gated(Preferences::default()),
            MemoryCache::new(),
            Surface::Dashboard,
        );
        controller.initialize().await.unwrap();

        let (first, second, ()) = tokio::join!(
            controller.save(PartialPreferences::default().defining_phrase("Nós")),
            controller.save(PartialPreferences::default().playlist_url(Some("X".into()))),
            async {
                tokio::task::yield_now().await;
                assert_eq!(controller.api().writes().len(), 2);
                assert_eq!(controller.phase(), Phase::Saving);
                controller.api().release(2);
            }
        );

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(controller.phase(), Phase::Ready);

        let visible = controller.preferences().unwrap();
        assert_eq!(visible.defining_phrase, "Nós");
        assert_eq!(visible.playlist_url.as_deref(), Some("X"));
    }
}
