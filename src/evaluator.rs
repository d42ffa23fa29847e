use crate::content::TargetText;

#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub enum CharState {
    #[default]
    Untyped,
    Correct,
    Incorrect,
}

/// Result of feeding one input change to the evaluator
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Judgement {
    /// Typed character matched the passage
    Correct,
    /// Typed character did not match
    Incorrect,
    /// The most recently typed character was deleted
    Retreated,
    /// Nothing changed (no input delta, nothing to delete, or passage done)
    Ignored,
}

/// Tracks the cursor, per-character states and mistakes for one passage
#[derive(Debug, Clone)]
pub struct Evaluator {
    text: TargetText,
    states: Vec<CharState>,
    cursor: usize,
    mistakes: usize,
    raw_len: usize,
}

impl Evaluator {
    pub fn new(text: TargetText) -> Self {
        let states = vec![CharState::Untyped; text.len()];
        Self {
            text,
            states,
            cursor: 0,
            mistakes: 0,
            raw_len: 0,
        }
    }

    /// Compares `raw` with the previously seen input. A shorter input deletes
    /// the last judged character; a longer one judges the character typed at
    /// the cursor.
    pub fn on_input_changed(&mut self, raw: &str) -> Judgement {
        if self.is_complete() {
            return Judgement::Ignored;
        }

        let len = raw.chars().count();
        let previous = std::mem::replace(&mut self.raw_len, len);

        if len < previous {
            self.retreat()
        } else if len == previous {
            Judgement::Ignored
        } else {
            match raw.chars().nth(self.cursor).or_else(|| raw.chars().last()) {
                Some(c) => self.advance(c),
                None => Judgement::Ignored,
            }
        }
    }

    fn advance(&mut self, typed: char) -> Judgement {
        let Some(expected) = self.text.char_at(self.cursor) else {
            return Judgement::Ignored;
        };

        let judgement = if typed == expected {
            self.states[self.cursor] = CharState::Correct;
            Judgement::Correct
        } else {
            self.states[self.cursor] = CharState::Incorrect;
            self.mistakes += 1;
            Judgement::Incorrect
        };
        self.cursor += 1;
        judgement
    }

    fn retreat(&mut self) -> Judgement {
        if self.cursor == 0 {
            return Judgement::Ignored;
        }

        self.cursor -= 1;
        if self.states[self.cursor] == CharState::Incorrect {
            self.mistakes = self.mistakes.saturating_sub(1);
        }
        self.states[self.cursor] = CharState::Untyped;
        Judgement::Retreated
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.text.len()
    }

    pub fn text(&self) -> &TargetText {
        &self.text
    }

    pub fn states(&self) -> &[CharState] {
        &self.states
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mistakes(&self) -> usize {
        self.mistakes
    }
}
