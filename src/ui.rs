use std::io;
use std::ops::Range;

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame, Terminal,
};
use unicode_width::UnicodeWidthChar;

use crate::{
    evaluator::CharState,
    session::{Phase, SessionView},
};

const HORIZONTAL_MARGIN: u16 = 5;
const RESULT_WIDTH: u16 = 36;
const RESULT_HEIGHT: u16 = 9;

/// Draws the session and places the caret on the character under the cursor.
/// Called after every state change and on terminal resize.
pub trait Renderer {
    fn render(&mut self, view: &SessionView<'_>) -> io::Result<()>;
}

pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self { terminal }
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn render(&mut self, view: &SessionView<'_>) -> io::Result<()> {
        self.terminal.draw(|f| draw(f, view))?;
        Ok(())
    }
}

pub fn draw(f: &mut Frame, view: &SessionView<'_>) {
    let area = f.area();
    f.render_widget(view, area);

    if view.phase != Phase::Finished {
        if let Some(caret) = caret_position(view, area) {
            f.set_cursor_position(caret);
        }
    }
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Splits the passage into display lines no wider than `width` columns,
/// breaking after spaces where possible and mid-word otherwise.
pub fn layout_lines(chars: &[char], width: usize) -> Vec<Range<usize>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut start = 0;
    let mut line_width = 0;
    let mut last_break = None;

    for (i, &c) in chars.iter().enumerate() {
        let w = char_width(c);
        if line_width + w > width && i > start {
            let end = match last_break {
                Some(b) if b > start => b,
                _ => i,
            };
            lines.push(start..end);
            start = end;
            line_width = chars[start..i].iter().map(|&c| char_width(c)).sum();
            last_break = None;
        }
        line_width += w;
        if c == ' ' {
            last_break = Some(i + 1);
        }
    }

    if start < chars.len() || lines.is_empty() {
        lines.push(start..chars.len());
    }
    lines
}

struct ScreenAreas {
    status: Rect,
    passage: Rect,
    legend: Rect,
}

fn screen_areas(area: Rect, line_count: usize) -> ScreenAreas {
    let passage_height = (line_count as u16).clamp(1, area.height.saturating_sub(2).max(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(passage_height),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .split(area);

    ScreenAreas {
        status: chunks[0],
        passage: chunks[2],
        legend: chunks[4],
    }
}

fn passage_width(area: Rect) -> usize {
    area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1) as usize
}

/// Screen cell of the character at the cursor, using the same line layout as
/// the passage drawing. `None` when that cell is off screen.
pub fn caret_position(view: &SessionView<'_>, area: Rect) -> Option<Position> {
    let chars = view.text.chars();
    let lines = layout_lines(chars, passage_width(area));
    let passage = screen_areas(area, lines.len()).passage;

    let row = lines
        .iter()
        .position(|line| line.contains(&view.cursor))
        .unwrap_or(lines.len() - 1);
    let line = &lines[row];
    let col: usize = chars[line.start..view.cursor.clamp(line.start, line.end)]
        .iter()
        .map(|&c| char_width(c))
        .sum();

    if row as u16 >= passage.height || passage.width == 0 {
        return None;
    }
    let col = (col as u16).min(passage.width - 1);
    Some(Position::new(passage.x + col, passage.y + row as u16))
}

impl Widget for &SessionView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);

        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);

        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);

        let underlined_dim_bold_style = Style::default()
            .patch(dim_bold_style)
            .add_modifier(Modifier::UNDERLINED);

        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chars = self.text.chars();
        let lines = layout_lines(chars, passage_width(area));
        let areas = screen_areas(area, lines.len());

        let status = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{} · {}", self.config.mode, self.config.duration),
                Style::default().fg(Color::Cyan).patch(bold_style),
            ),
            Span::styled(
                format!(
                    "   time {}s   wpm {}   mistakes {}   best {}",
                    self.remaining_secs, self.live_wpm, self.mistakes, self.best_score
                ),
                bold_style,
            ),
        ]))
        .alignment(Alignment::Center);
        status.render(areas.status, buf);

        let passage: Vec<Line> = lines
            .iter()
            .map(|line| {
                let spans = line
                    .clone()
                    .map(|idx| {
                        let c = chars[idx];
                        match self.states[idx] {
                            CharState::Incorrect => Span::styled(
                                match c {
                                    ' ' => "·".to_owned(),
                                    c => c.to_string(),
                                },
                                red_bold_style,
                            ),
                            CharState::Correct => Span::styled(c.to_string(), green_bold_style),
                            CharState::Untyped if idx == self.cursor => {
                                Span::styled(c.to_string(), underlined_dim_bold_style)
                            }
                            CharState::Untyped => Span::styled(c.to_string(), dim_bold_style),
                        }
                    })
                    .collect::<Vec<Span>>();
                Line::from(spans)
            })
            .collect();

        Paragraph::new(passage).render(areas.passage, buf);

        let legend = match self.phase {
            Phase::Idle if !self.clock_running => {
                "start typing or (enter) to start the clock / (tab) mode / (↑/↓) duration / (esc)ape"
            }
            Phase::Finished => "(r)etry / (tab) mode / (↑/↓) duration / (q)uit",
            _ => "(→) new text / (tab) mode / (↑/↓) duration / (esc)ape",
        };
        Paragraph::new(Span::styled(legend, italic_style))
            .alignment(Alignment::Center)
            .render(areas.legend, buf);

        if let Some(result) = self.result {
            let popup = centered(area, RESULT_WIDTH, RESULT_HEIGHT);
            Clear.render(popup, buf);

            let mut text = vec![
                Line::from(Span::styled(format!("{} wpm", result.wpm), bold_style)),
                Line::from(format!("{}% accuracy", result.accuracy)),
                Line::from(format!("{} mistakes", result.mistakes)),
                Line::from(format!("time {}", result.duration_label)),
            ];
            if result.is_new_record {
                text.push(Line::from(Span::styled(
                    "New record!",
                    Style::default().fg(Color::Yellow).patch(bold_style),
                )));
            }

            Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" Result "))
                .render(popup, buf);
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestDuration;
    use crate::content::{Mode, TargetText};
    use crate::session::{AttemptResult, SessionConfig};
    use ratatui::backend::TestBackend;

    fn view<'a>(
        text: &'a TargetText,
        states: &'a [CharState],
        cursor: usize,
        result: Option<&'a AttemptResult>,
    ) -> SessionView<'a> {
        SessionView {
            text,
            states,
            cursor,
            phase: if result.is_some() {
                Phase::Finished
            } else if cursor > 0 {
                Phase::Active
            } else {
                Phase::Idle
            },
            config: SessionConfig {
                mode: Mode::Code,
                duration: TestDuration::try_from(30).unwrap(),
            },
            clock_running: cursor > 0,
            remaining_secs: 27,
            live_wpm: 41,
            mistakes: 1,
            best_score: 88,
            result,
        }
    }

    fn rendered(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_layout_single_line() {
        assert_eq!(layout_lines(&chars("hello world"), 80), vec![0..11]);
    }

    #[test]
    fn test_layout_breaks_after_space() {
        let text = chars("the quick brown fox");

        let lines = layout_lines(&text, 10);

        let words: Vec<String> = lines
            .iter()
            .map(|l| text[l.clone()].iter().collect())
            .collect();
        assert_eq!(words, vec!["the quick ", "brown fox"]);
    }

    #[test]
    fn test_layout_breaks_long_word() {
        assert_eq!(layout_lines(&chars("abcdefghij"), 4), vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn test_layout_covers_every_char_once() {
        let text = chars("Design patterns are typical solutions to commonly occurring problems.");
        for width in 1..40 {
            let lines = layout_lines(&text, width);
            assert_eq!(lines.first().unwrap().start, 0);
            assert_eq!(lines.last().unwrap().end, text.len());
            for pair in lines.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn test_layout_empty_text() {
        assert_eq!(layout_lines(&[], 10), vec![0..0]);
    }

    #[test]
    fn test_caret_follows_cursor() {
        let text = TargetText::new("hello world");
        let states = [CharState::Untyped; 11];
        let area = Rect::new(0, 0, 80, 24);

        let start = caret_position(&view(&text, &states, 0, None), area).unwrap();
        let later = caret_position(&view(&text, &states, 4, None), area).unwrap();

        assert_eq!(start.x, HORIZONTAL_MARGIN);
        assert_eq!(later.x, start.x + 4);
        assert_eq!(later.y, start.y);
    }

    #[test]
    fn test_caret_moves_to_next_line() {
        // passage width is 20 - 2 * margin = 10
        let text = TargetText::new("the quick brown fox");
        let states = [CharState::Untyped; 19];
        let area = Rect::new(0, 0, 20, 10);

        let first = caret_position(&view(&text, &states, 9, None), area).unwrap();
        let wrapped = caret_position(&view(&text, &states, 10, None), area).unwrap();

        assert_eq!(wrapped.y, first.y + 1);
        assert_eq!(wrapped.x, HORIZONTAL_MARGIN);
    }

    #[test]
    fn test_caret_at_end_of_passage() {
        let text = TargetText::new("hi");
        let states = [CharState::Correct; 2];
        let area = Rect::new(0, 0, 80, 24);

        let caret = caret_position(&view(&text, &states, 2, None), area).unwrap();

        assert_eq!(caret.x, HORIZONTAL_MARGIN + 2);
    }

    #[test]
    fn test_render_typing_screen() {
        let text = TargetText::new("x = 1;");
        let states = [
            CharState::Correct,
            CharState::Incorrect,
            CharState::Untyped,
            CharState::Untyped,
            CharState::Untyped,
            CharState::Untyped,
        ];
        let mut renderer = TerminalRenderer::new(Terminal::new(TestBackend::new(80, 24)).unwrap());

        renderer.render(&view(&text, &states, 2, None)).unwrap();

        let content = rendered(renderer.terminal_mut());
        assert!(content.contains("code · 30s"));
        assert!(content.contains("time 27s"));
        assert!(content.contains("wpm 41"));
        assert!(content.contains("best 88"));
        // incorrect space is shown as a dot
        assert!(content.contains("x·= 1;"));

        let caret = renderer.terminal_mut().get_cursor_position().unwrap();
        assert_eq!(
            Some(caret),
            caret_position(&view(&text, &states, 2, None), Rect::new(0, 0, 80, 24))
        );
    }

    #[test]
    fn test_render_result_popup() {
        let text = TargetText::new("cat");
        let states = [CharState::Correct, CharState::Correct, CharState::Incorrect];
        let result = AttemptResult {
            wpm: 12,
            accuracy: 66,
            mistakes: 1,
            duration_label: "30s".to_string(),
            is_new_record: true,
        };
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        terminal
            .draw(|f| draw(f, &view(&text, &states, 3, Some(&result))))
            .unwrap();

        let content = rendered(&terminal);
        assert!(content.contains("12 wpm"));
        assert!(content.contains("66% accuracy"));
        assert!(content.contains("1 mistakes"));
        assert!(content.contains("time 30s"));
        assert!(content.contains("New record!"));
        assert!(content.contains("(r)etry"));
        assert!(content.contains("(q)uit"));
    }

    #[test]
    fn test_render_without_record_message() {
        let text = TargetText::new("cat");
        let states = [CharState::Correct; 3];
        let result = AttemptResult {
            wpm: 5,
            accuracy: 100,
            mistakes: 0,
            duration_label: "30s".to_string(),
            is_new_record: false,
        };
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        terminal
            .draw(|f| draw(f, &view(&text, &states, 3, Some(&result))))
            .unwrap();

        assert!(!rendered(&terminal).contains("New record!"));
    }

    #[test]
    fn test_render_small_area() {
        let text = TargetText::new("The quick brown fox jumps over the lazy dog.");
        let states = [CharState::Untyped; 44];
        let mut terminal = Terminal::new(TestBackend::new(12, 3)).unwrap();

        terminal
            .draw(|f| draw(f, &view(&text, &states, 0, None)))
            .unwrap();

        assert_eq!(terminal.backend().buffer().area, Rect::new(0, 0, 12, 3));
    }
}
