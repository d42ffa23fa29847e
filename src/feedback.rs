use std::io::{self, Write};

/// Audio cues for each judged keystroke. Fire-and-forget: implementations
/// swallow their own failures.
pub trait FeedbackPlayer {
    fn play_correct(&mut self);
    fn play_error(&mut self);
}

/// Rings the terminal bell on mistakes. Terminals have no click sound, so
/// correct keystrokes stay silent.
pub struct TerminalBell<W: Write> {
    out: W,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> FeedbackPlayer for TerminalBell<W> {
    fn play_correct(&mut self) {}

    fn play_error(&mut self) {
        let _ = self.out.write_all(b"\x07").and_then(|_| self.out.flush());
    }
}

/// No audio at all
#[derive(Debug, Default, Clone, Copy)]
pub struct Muted;

impl FeedbackPlayer for Muted {
    fn play_correct(&mut self) {}
    fn play_error(&mut self) {}
}
