use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    config::{Settings, SettingsStore},
    error::Result,
    runtime::{EventSource, Runner, SessionEvent, Ticker},
    session::{Phase, SessionController, Step},
    ui::Renderer,
};

/// What the event loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// The countdown started; the tick schedule restarts from now
    ClockStarted,
    Quit,
}

impl From<Step> for Control {
    fn from(step: Step) -> Self {
        match step {
            Step::ClockStarted => Control::ClockStarted,
            _ => Control::Continue,
        }
    }
}

/// Binds terminal keys to the session. Holds the raw input field that the
/// evaluator diffs against, and remembers mode/duration changes.
pub struct App {
    session: SessionController,
    input: String,
    settings: Settings,
    settings_store: Option<Box<dyn SettingsStore>>,
}

impl App {
    pub fn new(session: SessionController, settings: Settings) -> Self {
        Self {
            session,
            input: String::new(),
            settings,
            settings_store: None,
        }
    }

    pub fn with_settings_store(mut self, store: Box<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Applies one key. A passage that cannot be loaded is logged and the
    /// current attempt carries on.
    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        let finished = self.session.phase() == Phase::Finished;

        match key.code {
            KeyCode::Esc => return Control::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Control::Quit
            }
            KeyCode::Char('q') if finished => return Control::Quit,
            KeyCode::Char('r') | KeyCode::Char('n') if finished => self.retry(),
            KeyCode::Right => self.retry(),
            KeyCode::Enter if finished => self.retry(),
            KeyCode::Enter => return self.session.start_countdown().into(),
            KeyCode::Tab | KeyCode::BackTab => {
                let mode = self.session.config().mode.toggle();
                if let Err(e) = self.session.set_mode(mode) {
                    log::warn!("staying in {} mode: {e}", self.session.config().mode);
                    return Control::Continue;
                }
                self.input.clear();
                self.settings.mode = mode;
                self.save_settings();
            }
            KeyCode::Up | KeyCode::Down => {
                let current = self.session.config().duration;
                let duration = if key.code == KeyCode::Up {
                    current.next()
                } else {
                    current.prev()
                };
                if let Err(e) = self.session.set_duration(duration) {
                    log::warn!("keeping {}: {e}", current);
                    return Control::Continue;
                }
                self.input.clear();
                self.settings.duration = duration;
                self.save_settings();
            }
            KeyCode::Backspace if !finished => {
                self.input.pop();
                return self.session.on_input_changed(&self.input).into();
            }
            KeyCode::Char(c)
                if !finished
                    && !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.input.push(c);
                return self.session.on_input_changed(&self.input).into();
            }
            _ => {}
        }

        Control::Continue
    }

    pub fn handle_tick(&mut self) -> Step {
        self.session.on_tick()
    }

    fn retry(&mut self) {
        match self.session.retry() {
            Ok(()) => self.input.clear(),
            Err(e) => log::warn!("could not load a new passage: {e}"),
        }
    }

    fn save_settings(&self) {
        if let Some(store) = &self.settings_store {
            if let Err(e) = store.save(&self.settings) {
                log::warn!("could not save settings: {e}");
            }
        }
    }
}

/// Drives the app from `runner` until a quit key, redrawing after every
/// state change and on resize.
pub fn run<R, E, T>(app: &mut App, renderer: &mut R, runner: &mut Runner<E, T>) -> Result<()>
where
    R: Renderer,
    E: EventSource,
    T: Ticker,
{
    renderer.render(&app.session().view())?;

    loop {
        match runner.step() {
            SessionEvent::Tick => {
                if app.handle_tick() == Step::Ignored {
                    continue;
                }
            }
            SessionEvent::Resize => {}
            SessionEvent::Key(key) => match app.handle_key(key) {
                Control::Quit => break,
                Control::ClockStarted => runner.rearm(),
                Control::Continue => {}
            },
        }
        renderer.render(&app.session().view())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestDuration;
    use crate::config::FileSettingsStore;
    use crate::content::{ContentProvider, Mode, RandomIndex, TextPool};
    use crate::feedback::Muted;
    use crate::score::MemoryScoreStore;
    use crate::session::SessionConfig;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(prompt: &str) -> App {
        let provider = ContentProvider::custom(prompt, Box::new(RandomIndex::seeded(7)));
        let session = SessionController::new(
            SessionConfig::default(),
            provider,
            Box::new(MemoryScoreStore::default()),
            Box::new(Muted),
        )
        .unwrap();
        App::new(session, Settings::default())
    }

    fn type_str(app: &mut App, s: &str) -> Control {
        let mut last = Control::Continue;
        for c in s.chars() {
            last = app.handle_key(key(KeyCode::Char(c)));
        }
        last
    }

    #[test]
    fn test_first_key_starts_clock() {
        let mut app = app("hello");

        assert_eq!(type_str(&mut app, "h"), Control::ClockStarted);
        assert_eq!(type_str(&mut app, "e"), Control::Continue);
        assert_eq!(app.session().phase(), Phase::Active);
        assert_eq!(app.input(), "he");
    }

    #[test]
    fn test_backspace_retreats() {
        let mut app = app("hello");
        type_str(&mut app, "hx");
        assert_eq!(app.session().mistakes(), 1);

        app.handle_key(key(KeyCode::Backspace));

        assert_eq!(app.session().cursor(), 1);
        assert_eq!(app.session().mistakes(), 0);
        assert_eq!(app.input(), "h");
    }

    #[test]
    fn test_backspace_on_empty_input_is_ignored() {
        let mut app = app("hello");

        app.handle_key(key(KeyCode::Backspace));

        assert_eq!(app.session().cursor(), 0);
        assert_eq!(app.session().phase(), Phase::Idle);
    }

    #[test]
    fn test_completing_passage_finishes() {
        let mut app = app("hi");

        type_str(&mut app, "hi");

        assert_eq!(app.session().phase(), Phase::Finished);
        assert!(app.session().result().is_some());
    }

    #[test]
    fn test_typing_after_finish_is_ignored() {
        let mut app = app("hi");
        type_str(&mut app, "hi");

        type_str(&mut app, "xyz");

        assert_eq!(app.input(), "hi");
        assert_eq!(app.session().cursor(), 2);
    }

    #[test]
    fn test_retry_keys_after_finish() {
        for code in [KeyCode::Char('r'), KeyCode::Char('n'), KeyCode::Enter] {
            let mut app = app("hi");
            type_str(&mut app, "hi");

            app.handle_key(key(code));

            assert_eq!(app.session().phase(), Phase::Idle);
            assert_eq!(app.session().cursor(), 0);
            assert!(app.input().is_empty());
        }
    }

    #[test]
    fn test_r_is_typed_while_active() {
        let mut app = app("run");

        type_str(&mut app, "r");

        assert_eq!(app.session().cursor(), 1);
        assert_eq!(app.session().phase(), Phase::Active);
    }

    #[test]
    fn test_right_retries_mid_attempt() {
        let mut app = app("hello");
        type_str(&mut app, "hel");

        app.handle_key(key(KeyCode::Right));

        assert_eq!(app.session().phase(), Phase::Idle);
        assert_eq!(app.session().cursor(), 0);
        assert!(app.input().is_empty());
    }

    #[test]
    fn test_enter_starts_countdown_while_idle() {
        let mut app = app("hello");

        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Control::ClockStarted
        );
        assert!(app.session().clock().is_running());
        assert_eq!(app.session().phase(), Phase::Idle);

        // already running
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Control::Continue
        );
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app("hi");
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Control::Quit);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Control::Quit
        );

        // q is a regular character until the attempt is over
        assert_eq!(type_str(&mut app, "q"), Control::ClockStarted);
        let mut app = self::app("hi");
        type_str(&mut app, "hi");
        assert_eq!(type_str(&mut app, "q"), Control::Quit);
    }

    #[test]
    fn test_tab_toggles_mode_and_saves() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut app =
            app("hello").with_settings_store(Box::new(FileSettingsStore::with_path(&path)));
        type_str(&mut app, "he");

        app.handle_key(key(KeyCode::Tab));

        assert_eq!(app.session().config().mode, Mode::Code);
        assert_eq!(app.session().phase(), Phase::Idle);
        assert!(app.input().is_empty());
        let saved = FileSettingsStore::with_path(&path).load();
        assert_eq!(saved.mode, Mode::Code);
    }

    #[test]
    fn test_arrows_cycle_duration() {
        let mut app = app("hello");

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.session().config().duration.secs(), 120);
        assert_eq!(app.session().clock().remaining_secs(), 120);

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.session().config().duration.secs(), 30);

        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.settings().duration, TestDuration::try_from(120).unwrap());
    }

    #[test]
    fn test_tick_counts_down_after_start() {
        let mut app = app("hello");
        assert_eq!(app.handle_tick(), Step::Ignored);

        type_str(&mut app, "h");

        assert_eq!(app.handle_tick(), Step::Progressed);
        assert_eq!(app.session().clock().remaining_secs(), 59);
    }

    #[test]
    fn test_tab_with_empty_code_pool_keeps_attempt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let provider = ContentProvider::new(
            TextPool {
                name: "prose".into(),
                texts: vec!["hello".into()],
            },
            TextPool {
                name: "code".into(),
                texts: vec![],
            },
            Box::new(RandomIndex::seeded(7)),
        );
        let session = SessionController::new(
            SessionConfig::default(),
            provider,
            Box::new(MemoryScoreStore::default()),
            Box::new(Muted),
        )
        .unwrap();
        let mut app = App::new(session, Settings::default())
            .with_settings_store(Box::new(FileSettingsStore::with_path(&path)));
        type_str(&mut app, "he");

        assert_eq!(app.handle_key(key(KeyCode::Tab)), Control::Continue);

        assert_eq!(app.session().config().mode, Mode::Prose);
        assert_eq!(app.session().phase(), Phase::Active);
        assert!(app.session().clock().is_running());
        assert_eq!(app.input(), "he");
        assert_eq!(app.settings().mode, Mode::Prose);
        assert!(!path.exists());

        type_str(&mut app, "llo");
        assert_eq!(app.session().phase(), Phase::Finished);
    }
}
