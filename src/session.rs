use crate::clock::{ClockTick, SessionClock, TestDuration};
use crate::content::{ContentProvider, Mode, TargetText};
use crate::error::Result;
use crate::evaluator::{CharState, Evaluator, Judgement};
use crate::feedback::FeedbackPlayer;
use crate::history::{AttemptRecord, HistoryLog};
use crate::score::ScoreStore;
use crate::stats;
use chrono::Local;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub mode: Mode,
    pub duration: TestDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fresh passage, nothing typed yet
    Idle,
    /// At least one keystroke accepted, clock running
    Active,
    /// Passage completed or clock expired; result available
    Finished,
}

/// Summary surfaced when an attempt finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub mistakes: usize,
    pub duration_label: String,
    pub is_new_record: bool,
}

/// What an event did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing changed
    Ignored,
    /// State changed; redraw
    Progressed,
    /// The countdown just started; re-arm the tick schedule
    ClockStarted,
    /// The attempt just finished
    Finished,
}

/// Everything a renderer needs to draw the current state
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    pub text: &'a TargetText,
    pub states: &'a [CharState],
    pub cursor: usize,
    pub phase: Phase,
    pub config: SessionConfig,
    pub clock_running: bool,
    pub remaining_secs: u64,
    pub live_wpm: u32,
    pub mistakes: usize,
    pub best_score: u32,
    pub result: Option<&'a AttemptResult>,
}

/// Owns every piece of mutable state for the attempt lifecycle
pub struct SessionController {
    config: SessionConfig,
    provider: ContentProvider,
    evaluator: Evaluator,
    clock: SessionClock,
    phase: Phase,
    live_wpm: u32,
    best_score: u32,
    result: Option<AttemptResult>,
    scores: Box<dyn ScoreStore>,
    feedback: Box<dyn FeedbackPlayer>,
    history: Option<HistoryLog>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        mut provider: ContentProvider,
        scores: Box<dyn ScoreStore>,
        feedback: Box<dyn FeedbackPlayer>,
    ) -> Result<Self> {
        let text = provider.select_text(config.mode)?;
        let best_score = scores.read_best_score();
        log::info!(
            "new session: {} mode, {}, best {best_score} wpm",
            config.mode,
            config.duration
        );

        Ok(Self {
            config,
            provider,
            evaluator: Evaluator::new(text),
            clock: SessionClock::new(config.duration.secs()),
            phase: Phase::Idle,
            live_wpm: 0,
            best_score,
            result: None,
            scores,
            feedback,
            history: None,
        })
    }

    /// Log every finished attempt to `history`
    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    /// Feeds the full contents of the input field after it changed.
    pub fn on_input_changed(&mut self, raw: &str) -> Step {
        if self.phase == Phase::Finished {
            return Step::Ignored;
        }
        if self.evaluator.is_complete() || self.clock.is_expired() {
            return self.finish();
        }

        let judgement = self.evaluator.on_input_changed(raw);
        log::debug!(
            "{judgement:?} at {} ({} mistakes)",
            self.evaluator.cursor(),
            self.evaluator.mistakes()
        );

        match judgement {
            Judgement::Ignored => return Step::Ignored,
            Judgement::Correct => self.feedback.play_correct(),
            Judgement::Incorrect => self.feedback.play_error(),
            Judgement::Retreated => {}
        }

        let mut step = Step::Progressed;
        if self.phase == Phase::Idle {
            self.phase = Phase::Active;
            if !self.clock.is_running() {
                self.clock.start();
                step = Step::ClockStarted;
            }
        }

        if self.evaluator.is_complete() {
            return self.finish();
        }

        self.live_wpm = stats::live_wpm(
            self.evaluator.cursor(),
            self.evaluator.mistakes(),
            self.clock.elapsed_secs(),
        );
        step
    }

    /// One real-time second has passed.
    pub fn on_tick(&mut self) -> Step {
        if self.phase == Phase::Finished {
            return Step::Ignored;
        }

        match self.clock.tick() {
            ClockTick::Idle => Step::Ignored,
            ClockTick::Expired => self.finish(),
            ClockTick::Counted(remaining) => {
                log::trace!("{remaining}s left");
                self.live_wpm = stats::live_wpm(
                    self.evaluator.cursor(),
                    self.evaluator.mistakes(),
                    self.clock.elapsed_secs(),
                );
                Step::Progressed
            }
        }
    }

    /// Starts the countdown before the first keystroke. The session stays
    /// Idle until something is typed, so an untouched passage finishes
    /// straight from Idle when time runs out.
    pub fn start_countdown(&mut self) -> Step {
        if self.phase != Phase::Idle || self.clock.is_running() {
            return Step::Ignored;
        }
        self.clock.start();
        Step::ClockStarted
    }

    /// New passage in the current mode
    pub fn retry(&mut self) -> Result<()> {
        self.reset(self.config)
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.reset(SessionConfig { mode, ..self.config })
    }

    pub fn set_duration(&mut self, duration: TestDuration) -> Result<()> {
        self.reset(SessionConfig {
            duration,
            ..self.config
        })
    }

    /// Starts over with `config`. If no passage can be selected the current
    /// attempt is left exactly as it was.
    fn reset(&mut self, config: SessionConfig) -> Result<()> {
        let text = self.provider.select_text(config.mode)?;

        self.config = config;
        self.evaluator = Evaluator::new(text);
        self.clock.reset(config.duration.secs());
        self.phase = Phase::Idle;
        self.live_wpm = 0;
        self.result = None;
        log::info!(
            "reset: {} mode, {} ({} chars)",
            self.config.mode,
            self.config.duration,
            self.evaluator.text().len()
        );
        Ok(())
    }

    fn finish(&mut self) -> Step {
        if self.phase == Phase::Finished {
            return Step::Ignored;
        }
        self.clock.stop();
        self.phase = Phase::Finished;

        let cursor = self.evaluator.cursor();
        let mistakes = self.evaluator.mistakes();
        let elapsed = self.clock.elapsed_secs();
        let wpm = stats::final_wpm(cursor, mistakes, elapsed);
        let accuracy = stats::accuracy(cursor, mistakes);

        let is_new_record = wpm > self.best_score;
        if is_new_record {
            self.best_score = wpm;
            if let Err(e) = self.scores.write_best_score(wpm) {
                log::warn!("could not persist best score {wpm}: {e}");
            }
        }

        if let Some(history) = &self.history {
            let record = AttemptRecord {
                date: Local::now(),
                mode: self.config.mode,
                duration_secs: self.config.duration.secs(),
                elapsed_secs: elapsed,
                wpm,
                accuracy,
                mistakes,
            };
            if let Err(e) = history.append(&record) {
                log::warn!("could not append to attempt history: {e}");
            }
        }

        log::info!(
            "finished: {wpm} wpm, {accuracy}% acc, {mistakes} mistakes in {elapsed}s{}",
            if is_new_record { " (new record)" } else { "" }
        );

        self.live_wpm = wpm;
        self.result = Some(AttemptResult {
            wpm,
            accuracy,
            mistakes,
            duration_label: self.config.duration.label(),
            is_new_record,
        });
        Step::Finished
    }

    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            text: self.evaluator.text(),
            states: self.evaluator.states(),
            cursor: self.evaluator.cursor(),
            phase: self.phase,
            config: self.config,
            clock_running: self.clock.is_running(),
            remaining_secs: self.clock.remaining_secs(),
            live_wpm: self.live_wpm,
            mistakes: self.evaluator.mistakes(),
            best_score: self.best_score,
            result: self.result.as_ref(),
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn text(&self) -> &TargetText {
        self.evaluator.text()
    }

    pub fn cursor(&self) -> usize {
        self.evaluator.cursor()
    }

    pub fn mistakes(&self) -> usize {
        self.evaluator.mistakes()
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn live_wpm(&self) -> u32 {
        self.live_wpm
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }
}
