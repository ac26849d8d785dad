use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::action::{Action, Control};
use crate::auth::{AuthGateway, SessionState};
use crate::config::GeneratorConfig;
use crate::event::Event;
use crate::export;
use crate::feed::{Applied, Feed, FetchRequest};
use crate::form::Form;
use crate::jwt::UserIdentity;
use crate::scroll::ScrollTrigger;
use crate::types::{GenerationParameters, Region, ResultRow, MAX_ERROR_AMOUNT};

pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
pub const LOGIN_REQUIRED: &str = "Please log in to continue.";

/// Rows moved by PageUp/PageDown and Ctrl+u/Ctrl+d.
const PAGE_STEP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Generator,
}

/// State that only exists while the generator screen is shown. Built on
/// entry and dropped on exit, so the scroll subscription never outlives the
/// screen.
pub struct Generator {
    pub feed: Feed,
    pub trigger: ScrollTrigger,
    pub focus: Control,
    pub selected: usize,
    /// Highlighted entry while the region picker is open.
    pub region_popup: Option<usize>,
    pub errors_input: String,
    pub seed_input: String,
}

impl Generator {
    fn new(params: GenerationParameters, threshold: usize) -> Self {
        Self {
            feed: Feed::new(params),
            trigger: ScrollTrigger::new(threshold),
            focus: Control::default(),
            selected: 0,
            region_popup: None,
            errors_input: params.error_amount.to_string(),
            seed_input: params.seed.to_string(),
        }
    }

    pub fn params(&self) -> GenerationParameters {
        self.feed.params()
    }
}

pub struct App {
    pub screen: Screen,
    pub login_form: Form,
    pub register_form: Form,
    pub generator: Option<Generator>,
    pub identity: Option<UserIdentity>,
    /// An auth round-trip is in flight.
    pub busy: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub should_quit: bool,
    settings: GeneratorConfig,
    /// Parameters survive leaving and re-entering the generator.
    last_params: GenerationParameters,
    gateway: Arc<AuthGateway>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        gateway: Arc<AuthGateway>,
        session: SessionState,
        settings: GeneratorConfig,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        let identity = match session {
            SessionState::Authenticated(identity) => Some(identity),
            SessionState::Unauthenticated => None,
        };

        Self {
            screen: Screen::Login,
            login_form: Form::login(),
            register_form: Form::register(),
            generator: None,
            identity,
            busy: false,
            error: None,
            notice: None,
            should_quit: false,
            last_params: settings.initial_params(),
            settings,
            gateway,
            action_tx,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.busy
            || self
                .generator
                .as_ref()
                .is_some_and(|g| g.feed.is_loading())
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::Start,
            Event::Key(key) => self.handle_key(key),
            Event::Wheel(delta) if self.screen == Screen::Generator => {
                if delta > 0 {
                    Action::ScrollDown
                } else {
                    Action::ScrollUp
                }
            }
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        match self.screen {
            Screen::Login | Screen::Register => self.handle_form_key(key),
            Screen::Generator => self.handle_generator_key(key),
        }
    }

    fn handle_form_key(&self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => match self.screen {
                Screen::Register => Action::SwitchAuthScreen,
                _ => Action::Quit,
            },
            KeyCode::Char('r') if ctrl => Action::SwitchAuthScreen,
            KeyCode::Tab | KeyCode::Down => Action::FocusNext,
            KeyCode::BackTab | KeyCode::Up => Action::FocusPrev,
            KeyCode::Enter => Action::Submit,
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Char(c) if !ctrl => Action::Input(c),
            _ => Action::None,
        }
    }

    fn handle_generator_key(&self, key: KeyEvent) -> Action {
        let Some(generator) = &self.generator else {
            return Action::None;
        };

        if generator.region_popup.is_some() {
            return match key.code {
                KeyCode::Char('j') | KeyCode::Down => Action::PopupDown,
                KeyCode::Char('k') | KeyCode::Up => Action::PopupUp,
                KeyCode::Enter => Action::PopupSelect,
                KeyCode::Esc | KeyCode::Char('q') => Action::ClosePopup,
                _ => Action::None,
            };
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match (key.code, generator.focus) {
            (KeyCode::Char('q') | KeyCode::Esc, _) => Action::Quit,
            (KeyCode::Tab, _) => Action::FocusNext,
            (KeyCode::BackTab, _) => Action::FocusPrev,
            (KeyCode::Char('e'), _) => Action::Export,
            (KeyCode::Char('L'), _) => Action::Logout,
            (KeyCode::Char('R'), _) => Action::RandomSeed,
            (KeyCode::Char('r'), _) => Action::Refresh,

            (KeyCode::Enter, Control::Region) => Action::OpenRegionSelect,
            (KeyCode::Left, Control::Region) => Action::ShiftRegion(-1),
            (KeyCode::Right, Control::Region) => Action::ShiftRegion(1),

            (KeyCode::Left, Control::Errors) => Action::AdjustErrors(-1),
            (KeyCode::Right, Control::Errors) => Action::AdjustErrors(1),
            (KeyCode::PageDown, Control::Errors) => Action::AdjustErrors(-50),
            (KeyCode::PageUp, Control::Errors) => Action::AdjustErrors(50),

            (KeyCode::Char(c), Control::Errors | Control::Seed) if c.is_ascii_digit() => {
                Action::Input(c)
            }
            (KeyCode::Backspace, Control::Errors | Control::Seed) => Action::Backspace,

            (KeyCode::Char('d'), Control::Table) if ctrl => Action::PageDown,
            (KeyCode::Char('u'), Control::Table) if ctrl => Action::PageUp,
            (KeyCode::Char('j') | KeyCode::Down, Control::Table) => Action::ScrollDown,
            (KeyCode::Char('k') | KeyCode::Up, Control::Table) => Action::ScrollUp,
            (KeyCode::PageDown, Control::Table) => Action::PageDown,
            (KeyCode::PageUp, Control::Table) => Action::PageUp,
            (KeyCode::Char('g') | KeyCode::Home, Control::Table) => Action::GoToTop,
            (KeyCode::Char('G') | KeyCode::End, Control::Table) => Action::GoToBottom,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if !matches!(
            action,
            Action::None | Action::PageLoaded { .. } | Action::Exported { .. }
        ) {
            self.error = None;
            self.notice = None;
        }

        match action {
            Action::Start => {
                let target = if self.identity.is_some() {
                    Screen::Generator
                } else {
                    Screen::Login
                };
                self.navigate(target);
            }
            Action::Quit => {
                self.should_quit = true;
            }

            Action::ScrollUp => self.move_selection(-1),
            Action::ScrollDown => self.move_selection(1),
            Action::PageUp => self.move_selection(-(PAGE_STEP as isize)),
            Action::PageDown => self.move_selection(PAGE_STEP as isize),
            Action::GoToTop => self.move_selection(isize::MIN),
            Action::GoToBottom => self.move_selection(isize::MAX),

            Action::FocusNext => self.shift_focus(true),
            Action::FocusPrev => self.shift_focus(false),

            Action::Input(c) => match self.screen {
                Screen::Generator => self.edit_number(Some(c)),
                _ => self.active_form().input(c),
            },
            Action::Backspace => match self.screen {
                Screen::Generator => self.edit_number(None),
                _ => self.active_form().backspace(),
            },

            Action::Submit => self.submit(),
            Action::SwitchAuthScreen => {
                let target = match self.screen {
                    Screen::Login => Screen::Register,
                    _ => Screen::Login,
                };
                self.navigate(target);
            }
            Action::LoggedIn(identity) => {
                self.busy = false;
                self.login_form.clear_secrets();
                self.identity = Some(*identity);
                self.navigate(Screen::Generator);
            }
            Action::Registered { email } => {
                self.busy = false;
                self.register_form = Form::register();
                self.login_form.set_value("Email", &email);
                self.login_form.focus = 1;
                self.navigate(Screen::Login);
                self.notice = Some("Registration successful. Please log in.".to_string());
            }
            Action::AuthFailed(message) => {
                self.busy = false;
                self.error = Some(message);
            }

            Action::OpenRegionSelect => {
                if let Some(g) = self.generator.as_mut() {
                    g.region_popup = Some(g.params().region.index());
                }
            }
            Action::PopupUp => {
                if let Some(g) = self.generator.as_mut() {
                    if let Some(i) = g.region_popup.as_mut() {
                        *i = i.saturating_sub(1);
                    }
                }
            }
            Action::PopupDown => {
                if let Some(g) = self.generator.as_mut() {
                    if let Some(i) = g.region_popup.as_mut() {
                        *i = (*i + 1).min(Region::ALL.len() - 1);
                    }
                }
            }
            Action::PopupSelect => {
                let choice = self
                    .generator
                    .as_mut()
                    .and_then(|g| g.region_popup.take())
                    .and_then(|i| Region::ALL.get(i).copied());
                if let Some(region) = choice {
                    self.change_params(|p| p.with_region(region));
                }
            }
            Action::ClosePopup => {
                if let Some(g) = self.generator.as_mut() {
                    g.region_popup = None;
                }
            }
            Action::ShiftRegion(delta) => {
                let len = Region::ALL.len() as i32;
                self.change_params(|p| {
                    let i = (p.region.index() as i32 + delta).rem_euclid(len);
                    p.with_region(Region::ALL[i as usize])
                });
            }
            Action::AdjustErrors(delta) => {
                self.change_params(|p| {
                    let next = (p.error_amount as i64 + delta as i64)
                        .clamp(0, MAX_ERROR_AMOUNT as i64);
                    p.with_error_amount(next as u32)
                });
            }
            Action::RandomSeed => {
                let seed = rand::random_range(0..1_000_000u64);
                self.change_params(|p| p.with_seed(seed));
            }
            Action::Refresh => {
                if let Some(g) = self.generator.as_mut() {
                    let request = g.feed.refresh();
                    self.spawn_fetch(request);
                }
            }

            Action::PageLoaded {
                generation,
                result,
                authenticated,
            } => {
                if let Some(g) = self.generator.as_mut() {
                    match g.feed.apply(generation, result) {
                        Applied::Replaced(_) => {
                            g.selected = 0;
                            g.trigger.reset();
                        }
                        Applied::Failed(message) => {
                            self.error = Some(message);
                        }
                        Applied::Exhausted => {
                            g.trigger.detach();
                            self.notice = Some("No more rows for these settings.".to_string());
                        }
                        Applied::Appended(_) | Applied::Stale => {}
                    }
                }
                if !authenticated && self.identity.is_some() {
                    self.end_session(SESSION_EXPIRED);
                }
            }

            Action::Export => {
                if let Some(g) = &self.generator {
                    self.spawn_export(g.feed.rows().to_vec(), self.settings.export_path.clone());
                }
            }
            Action::Exported { path, rows } => {
                self.notice = Some(format!("Exported {} rows to {}", rows, path.display()));
            }

            Action::Logout => {
                self.busy = true;
                self.spawn_logout();
            }
            Action::LoggedOut => {
                self.busy = false;
                self.identity = None;
                self.login_form = Form::login();
                self.navigate(Screen::Login);
            }

            Action::Error(msg) => {
                self.busy = false;
                self.error = Some(msg);
            }
            Action::None => {}
        }
    }

    /// Switch screens, enforcing that the generator is only reachable with a
    /// session. Leaving the generator tears down its state.
    fn navigate(&mut self, target: Screen) {
        let target = if target == Screen::Generator && self.identity.is_none() {
            self.error = Some(LOGIN_REQUIRED.to_string());
            Screen::Login
        } else {
            target
        };

        if target != Screen::Generator {
            if let Some(g) = self.generator.take() {
                self.last_params = g.params();
            }
        } else if self.generator.is_none() {
            let mut generator = Generator::new(self.last_params, self.settings.scroll_threshold);
            let request = generator.feed.set_params(self.last_params);
            self.generator = Some(generator);
            if let Some(request) = request {
                self.spawn_fetch(request);
            }
        }

        self.screen = target;
    }

    fn end_session(&mut self, message: &str) {
        tracing::info!("session ended, returning to login");
        self.identity = None;
        self.navigate(Screen::Login);
        self.error = Some(message.to_string());
    }

    fn shift_focus(&mut self, forward: bool) {
        if self.screen == Screen::Generator {
            if let Some(g) = self.generator.as_mut() {
                g.focus = if forward { g.focus.next() } else { g.focus.prev() };
            }
            return;
        }
        let form = self.active_form();
        if forward {
            form.focus_next();
        } else {
            form.focus_prev();
        }
    }

    fn active_form(&mut self) -> &mut Form {
        match self.screen {
            Screen::Register => &mut self.register_form,
            _ => &mut self.login_form,
        }
    }

    fn submit(&mut self) {
        if self.busy {
            return;
        }
        match self.screen {
            Screen::Login => {
                let email = self.login_form.value("Email").to_string();
                let password = self.login_form.value("Password").to_string();
                if email.trim().is_empty() || password.is_empty() {
                    self.error = Some("Email and password are required.".to_string());
                    return;
                }
                self.busy = true;
                self.spawn_login(email, password);
            }
            Screen::Register => {
                let name = self.register_form.value("Name").to_string();
                let email = self.register_form.value("Email").to_string();
                let password = self.register_form.value("Password").to_string();
                self.busy = true;
                self.spawn_register(name, email, password);
            }
            Screen::Generator => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let Some(g) = self.generator.as_mut() else {
            return;
        };
        let total = g.feed.rows().len();
        if total == 0 {
            return;
        }

        g.selected = g.selected.saturating_add_signed(delta).min(total - 1);

        if g.trigger.observe(g.selected, total) {
            if let Some(request) = g.feed.next_page() {
                self.spawn_fetch(request);
            }
        }
    }

    /// Digit entry and deletion for the focused numeric control. Input that
    /// would not parse is ignored; an empty field means zero.
    fn edit_number(&mut self, c: Option<char>) {
        let Some(g) = self.generator.as_mut() else {
            return;
        };
        let focus = g.focus;
        let buffer = match focus {
            Control::Errors => &mut g.errors_input,
            Control::Seed => &mut g.seed_input,
            _ => return,
        };

        let mut candidate = buffer.clone();
        match c {
            Some(c) => {
                if candidate == "0" {
                    candidate.clear();
                }
                candidate.push(c);
            }
            None => {
                candidate.pop();
            }
        }

        let value = if candidate.is_empty() {
            0
        } else {
            match candidate.parse::<u64>() {
                Ok(v) => v,
                Err(_) => return,
            }
        };

        match focus {
            Control::Errors => {
                let clamped = value.min(MAX_ERROR_AMOUNT as u64) as u32;
                self.change_params(|p| p.with_error_amount(clamped));
            }
            _ => self.change_params(|p| p.with_seed(value)),
        }

        // Keep what the user typed unless clamping changed the number.
        if let Some(g) = self.generator.as_mut() {
            let buffer = match focus {
                Control::Errors => &mut g.errors_input,
                _ => &mut g.seed_input,
            };
            let shown = match focus {
                Control::Errors => g.feed.params().error_amount as u64,
                _ => g.feed.params().seed,
            };
            *buffer = if candidate.is_empty() || shown != value {
                shown.to_string()
            } else {
                candidate
            };
        }
    }

    fn change_params(&mut self, f: impl FnOnce(GenerationParameters) -> GenerationParameters) {
        let Some(g) = self.generator.as_mut() else {
            return;
        };
        let params = f(g.params());
        g.errors_input = params.error_amount.to_string();
        g.seed_input = params.seed.to_string();
        self.last_params = params;
        if let Some(request) = g.feed.set_params(params) {
            self.spawn_fetch(request);
        }
    }

    fn spawn_fetch(&self, request: FetchRequest) {
        let tx = self.action_tx.clone();
        let gateway = Arc::clone(&self.gateway);
        tokio::spawn(async move {
            let result = gateway.generate_data(&request.params, request.page).await;
            let authenticated = gateway.is_authenticated().await;
            tx.send(Action::PageLoaded {
                generation: request.generation,
                result,
                authenticated,
            })
            .ok();
        });
    }

    fn spawn_login(&self, email: String, password: String) {
        let tx = self.action_tx.clone();
        let gateway = Arc::clone(&self.gateway);
        tokio::spawn(async move {
            match gateway.login(&email, &password).await {
                Ok(identity) => {
                    tx.send(Action::LoggedIn(Box::new(identity))).ok();
                }
                Err(e) => {
                    tx.send(Action::AuthFailed(e.user_message())).ok();
                }
            }
        });
    }

    fn spawn_register(&self, name: String, email: String, password: String) {
        let tx = self.action_tx.clone();
        let gateway = Arc::clone(&self.gateway);
        tokio::spawn(async move {
            match gateway.register(&name, &email, &password).await {
                Ok(()) => {
                    tx.send(Action::Registered { email }).ok();
                }
                Err(e) => {
                    tx.send(Action::AuthFailed(e.user_message())).ok();
                }
            }
        });
    }

    fn spawn_logout(&self) {
        let tx = self.action_tx.clone();
        let gateway = Arc::clone(&self.gateway);
        tokio::spawn(async move {
            gateway.logout().await;
            tx.send(Action::LoggedOut).ok();
        });
    }

    fn spawn_export(&self, rows: Vec<ResultRow>, path: PathBuf) {
        let tx = self.action_tx.clone();
        tokio::task::spawn_blocking(move || {
            let action = match export::export_to_path(&rows, &path) {
                Ok(()) => Action::Exported {
                    path,
                    rows: rows.len(),
                },
                Err(e) => Action::Error(format!("Export failed: {}", e)),
            };
            tx.send(action).ok();
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::jwt::encode_unsigned;
    use crate::store::{CredentialStore, MemoryStore, ACCESS_TOKEN, REFRESH_TOKEN};
    use crate::types::TokenPair;

    fn live_token() -> String {
        encode_unsigned(&json!({ "email": "ann@example.com", "exp": 4_000_000_000i64 }))
    }

    fn settings() -> GeneratorConfig {
        GeneratorConfig {
            scroll_threshold: 3,
            ..GeneratorConfig::default()
        }
    }

    async fn setup(
        backend: Arc<FakeBackend>,
        store: Arc<MemoryStore>,
        settings: GeneratorConfig,
    ) -> (App, mpsc::UnboundedReceiver<Action>) {
        let gateway = Arc::new(AuthGateway::restore(backend, store));
        let session = gateway.state().await;
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(gateway, session, settings, tx), rx)
    }

    fn signed_in_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store.set(ACCESS_TOKEN, &live_token());
        store.set(REFRESH_TOKEN, "r1");
        store
    }

    /// Feed the next background result back into the app.
    async fn pump(app: &mut App, rx: &mut mpsc::UnboundedReceiver<Action>) {
        let action = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("background task did not report back")
            .expect("channel closed");
        app.update(action);
    }

    fn row_ids(app: &App) -> Vec<String> {
        app.generator
            .as_ref()
            .map(|g| g.feed.rows().iter().map(|r| r.identifier.clone()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn anonymous_start_lands_on_login() {
        let (mut app, _rx) = setup(
            Arc::new(FakeBackend::new(5)),
            Arc::new(MemoryStore::default()),
            settings(),
        )
        .await;
        app.update(Action::Start);
        assert_eq!(app.screen, Screen::Login);
        assert!(app.generator.is_none());
    }

    #[tokio::test]
    async fn generator_is_guarded() {
        let (mut app, _rx) = setup(
            Arc::new(FakeBackend::new(5)),
            Arc::new(MemoryStore::default()),
            settings(),
        )
        .await;
        app.navigate(Screen::Generator);
        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.error.as_deref(), Some(LOGIN_REQUIRED));
        assert!(app.generator.is_none());
    }

    #[tokio::test]
    async fn restored_session_loads_first_page() {
        let (mut app, mut rx) =
            setup(Arc::new(FakeBackend::new(5)), signed_in_store(), settings()).await;
        app.update(Action::Start);
        assert_eq!(app.screen, Screen::Generator);
        assert!(app.is_loading());

        pump(&mut app, &mut rx).await;
        assert!(!app.is_loading());
        assert_eq!(row_ids(&app).len(), 5);
        assert_eq!(row_ids(&app)[0], "US-0-0-1-0");
    }

    #[tokio::test]
    async fn login_flow_reaches_generator() {
        let backend = Arc::new(FakeBackend::new(4));
        *backend.login_result.lock().unwrap() = Some(TokenPair {
            access_token: live_token(),
            refresh_token: "r1".to_string(),
        });
        let store = Arc::new(MemoryStore::default());
        let (mut app, mut rx) = setup(backend, store.clone(), settings()).await;
        app.update(Action::Start);

        for c in "ann@example.com".chars() {
            app.update(Action::Input(c));
        }
        app.update(Action::FocusNext);
        for c in "secret".chars() {
            app.update(Action::Input(c));
        }
        app.update(Action::Submit);
        assert!(app.busy);

        pump(&mut app, &mut rx).await;
        assert_eq!(app.screen, Screen::Generator);
        assert_eq!(app.login_form.value("Password"), "");
        assert!(store.get(REFRESH_TOKEN).is_some());

        pump(&mut app, &mut rx).await;
        assert_eq!(row_ids(&app).len(), 4);
    }

    #[tokio::test]
    async fn bad_login_shows_message() {
        let (mut app, mut rx) = setup(
            Arc::new(FakeBackend::new(4)),
            Arc::new(MemoryStore::default()),
            settings(),
        )
        .await;
        app.update(Action::Start);
        app.login_form.set_value("Email", "ann@example.com");
        app.login_form.set_value("Password", "wrong");
        app.update(Action::Submit);

        pump(&mut app, &mut rx).await;
        assert_eq!(app.screen, Screen::Login);
        assert!(!app.busy);
        assert_eq!(app.error.as_deref(), Some(crate::auth::LOGIN_FAILED));
        assert!(app.identity.is_none());
    }

    #[tokio::test]
    async fn empty_login_is_rejected_locally() {
        let (mut app, _rx) = setup(
            Arc::new(FakeBackend::new(4)),
            Arc::new(MemoryStore::default()),
            settings(),
        )
        .await;
        app.update(Action::Start);
        app.update(Action::Submit);
        assert!(!app.busy);
        assert!(app.error.is_some());
    }

    #[tokio::test]
    async fn register_returns_to_login_with_email() {
        let (mut app, mut rx) = setup(
            Arc::new(FakeBackend::new(4)),
            Arc::new(MemoryStore::default()),
            settings(),
        )
        .await;
        app.update(Action::Start);
        app.update(Action::SwitchAuthScreen);
        assert_eq!(app.screen, Screen::Register);

        app.register_form.set_value("Name", "Ann");
        app.register_form.set_value("Email", "ann@example.com");
        app.register_form.set_value("Password", "pw");
        app.update(Action::Submit);

        pump(&mut app, &mut rx).await;
        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.login_form.value("Email"), "ann@example.com");
        assert!(app.notice.is_some());
        assert!(app.identity.is_none());
    }

    #[tokio::test]
    async fn scrolling_near_end_appends_next_page() {
        let (mut app, mut rx) =
            setup(Arc::new(FakeBackend::new(10)), signed_in_store(), settings()).await;
        app.update(Action::Start);
        pump(&mut app, &mut rx).await;
        let first_page = row_ids(&app);

        for _ in 0..5 {
            app.update(Action::ScrollDown);
        }
        assert!(!app.is_loading());

        app.update(Action::GoToBottom);
        assert!(app.is_loading());
        // Further movement inside the zone does not queue another page.
        app.update(Action::ScrollUp);
        app.update(Action::ScrollDown);

        pump(&mut app, &mut rx).await;
        let ids = row_ids(&app);
        assert_eq!(ids.len(), 20);
        assert_eq!(&ids[..10], first_page.as_slice());
        assert_eq!(ids[10], "US-0-0-2-0");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn parameter_change_replaces_rows_and_drops_stale_page() {
        let (mut app, mut rx) =
            setup(Arc::new(FakeBackend::new(10)), signed_in_store(), settings()).await;
        app.update(Action::Start);
        pump(&mut app, &mut rx).await;

        app.update(Action::GoToBottom);
        app.update(Action::FocusPrev);
        app.update(Action::Input('7'));
        assert_eq!(app.generator.as_ref().unwrap().params().seed, 7);

        pump(&mut app, &mut rx).await;
        pump(&mut app, &mut rx).await;

        let ids = row_ids(&app);
        assert_eq!(ids.len(), 10);
        assert!(ids.iter().all(|id| id.starts_with("US-0-7-1-")));
        assert_eq!(app.generator.as_ref().unwrap().selected, 0);
    }

    #[tokio::test]
    async fn region_popup_changes_region() {
        let (mut app, mut rx) =
            setup(Arc::new(FakeBackend::new(2)), signed_in_store(), settings()).await;
        app.update(Action::Start);
        pump(&mut app, &mut rx).await;

        app.update(Action::OpenRegionSelect);
        assert_eq!(
            app.generator.as_ref().unwrap().region_popup,
            Some(Region::US.index())
        );
        app.update(Action::PopupUp);
        app.update(Action::PopupSelect);
        assert!(app.generator.as_ref().unwrap().region_popup.is_none());

        pump(&mut app, &mut rx).await;
        assert!(row_ids(&app).iter().all(|id| id.starts_with("UA-")));
    }

    #[tokio::test]
    async fn error_amount_entry_is_clamped() {
        let (mut app, _rx) =
            setup(Arc::new(FakeBackend::new(2)), signed_in_store(), settings()).await;
        app.update(Action::Start);
        app.update(Action::FocusNext);
        app.update(Action::FocusNext);
        assert_eq!(app.generator.as_ref().unwrap().focus, Control::Errors);

        for c in "1500".chars() {
            app.update(Action::Input(c));
        }
        let g = app.generator.as_ref().unwrap();
        assert_eq!(g.params().error_amount, MAX_ERROR_AMOUNT);
        assert_eq!(g.errors_input, "1000");

        app.update(Action::AdjustErrors(-1));
        assert_eq!(app.generator.as_ref().unwrap().params().error_amount, 999);
    }

    #[tokio::test]
    async fn seed_backspace_to_empty_means_zero() {
        let (mut app, _rx) =
            setup(Arc::new(FakeBackend::new(2)), signed_in_store(), settings()).await;
        app.update(Action::Start);
        app.update(Action::FocusPrev);
        assert_eq!(app.generator.as_ref().unwrap().focus, Control::Seed);

        app.update(Action::Input('4'));
        app.update(Action::Input('2'));
        assert_eq!(app.generator.as_ref().unwrap().seed_input, "42");
        app.update(Action::Backspace);
        app.update(Action::Backspace);
        let g = app.generator.as_ref().unwrap();
        assert_eq!(g.params().seed, 0);
        assert_eq!(g.seed_input, "0");
    }

    #[tokio::test]
    async fn server_error_keeps_rows_and_shows_message() {
        let backend = Arc::new(FakeBackend::new(3));
        let (mut app, mut rx) = setup(backend.clone(), signed_in_store(), settings()).await;
        app.update(Action::Start);
        pump(&mut app, &mut rx).await;

        *backend.generate_failure.lock().unwrap() = Some((400, "Seed too large".to_string()));
        app.update(Action::Refresh);
        pump(&mut app, &mut rx).await;

        assert_eq!(app.error.as_deref(), Some("Seed too large"));
        assert_eq!(row_ids(&app).len(), 3);
        assert_eq!(app.screen, Screen::Generator);
    }

    #[tokio::test]
    async fn failed_refresh_redirects_to_login() {
        let store = Arc::new(MemoryStore::default());
        store.set(
            ACCESS_TOKEN,
            &encode_unsigned(&json!({ "email": "ann@example.com", "exp": 1_000 })),
        );
        store.set(REFRESH_TOKEN, "r1");
        let backend = Arc::new(FakeBackend::new(3));
        let (mut app, mut rx) = setup(backend.clone(), store.clone(), settings()).await;

        app.update(Action::Start);
        assert_eq!(app.screen, Screen::Generator);
        pump(&mut app, &mut rx).await;

        assert_eq!(backend.refresh_count(), 1);
        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.error.as_deref(), Some(SESSION_EXPIRED));
        assert!(app.identity.is_none());
        assert!(app.generator.is_none());
        assert_eq!(store.get(ACCESS_TOKEN), None);
    }

    #[tokio::test]
    async fn logout_returns_to_login_and_clears_tokens() {
        let store = signed_in_store();
        let (mut app, mut rx) =
            setup(Arc::new(FakeBackend::new(3)), store.clone(), settings()).await;
        app.update(Action::Start);
        pump(&mut app, &mut rx).await;

        app.update(Action::Logout);
        pump(&mut app, &mut rx).await;

        assert_eq!(app.screen, Screen::Login);
        assert!(app.identity.is_none());
        assert!(app.generator.is_none());
        assert_eq!(store.get(ACCESS_TOKEN), None);
        assert_eq!(store.get(REFRESH_TOKEN), None);
    }

    #[tokio::test]
    async fn export_writes_current_rows() {
        let path = std::env::temp_dir().join(format!("rugen-app-export-{}.csv", std::process::id()));
        let settings = GeneratorConfig {
            export_path: path.clone(),
            ..settings()
        };
        let (mut app, mut rx) =
            setup(Arc::new(FakeBackend::new(6)), signed_in_store(), settings).await;
        app.update(Action::Start);
        pump(&mut app, &mut rx).await;

        app.update(Action::Export);
        pump(&mut app, &mut rx).await;

        assert!(app.notice.as_deref().unwrap().starts_with("Exported 6 rows"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 7);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn exhausted_feed_stops_listening() {
        let backend = Arc::new(FakeBackend {
            rows_per_page: 4,
            last_page: 1,
            ..FakeBackend::default()
        });
        let (mut app, mut rx) = setup(backend, signed_in_store(), settings()).await;
        app.update(Action::Start);
        pump(&mut app, &mut rx).await;

        app.update(Action::GoToBottom);
        pump(&mut app, &mut rx).await;
        let g = app.generator.as_ref().unwrap();
        assert!(g.feed.is_exhausted());
        assert!(!g.trigger.is_attached());
        assert_eq!(g.feed.rows().len(), 4);
    }
}
