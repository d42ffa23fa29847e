use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use env_logger::{Env, Target};
use ratatui::{backend::CrosstermBackend, Terminal};

use protype::{
    app::{self, App},
    app_dirs::AppDirs,
    clock::TestDuration,
    config::{FileSettingsStore, Settings, SettingsStore},
    content::{ContentProvider, IndexSource, Mode, RandomIndex},
    feedback::{FeedbackPlayer, Muted, TerminalBell},
    history::HistoryLog,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    score::{FileScoreStore, ScoreStore},
    session::{SessionConfig, SessionController},
    ui::TerminalRenderer,
};

const HISTORY_ROWS: usize = 10;

/// timed typing test over prose and code passages
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// passage pool to draw from (defaults to the last one used)
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// seconds on the clock: 30, 60 or 120 (defaults to the last one used)
    #[clap(short = 'd', long)]
    duration: Option<TestDuration>,

    /// custom passage to type instead of the built-in ones
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// seed for passage selection, for repeatable runs
    #[clap(long)]
    seed: Option<u64>,

    /// disable the error bell
    #[clap(long)]
    mute: bool,

    /// print recent attempts and the best score, then exit
    #[clap(long)]
    history: bool,
}

impl Cli {
    /// Stored preferences with any flags given on the command line applied
    fn apply(&self, stored: Settings) -> Settings {
        Settings {
            mode: self.mode.unwrap_or(stored.mode),
            duration: self.duration.unwrap_or(stored.duration),
            sound: stored.sound && !self.mute,
        }
    }

    fn content_provider(&self) -> protype::error::Result<ContentProvider> {
        let picker: Box<dyn IndexSource> = match self.seed {
            Some(seed) => Box::new(RandomIndex::seeded(seed)),
            None => Box::new(RandomIndex::from_entropy()),
        };
        match &self.prompt {
            Some(prompt) => Ok(ContentProvider::custom(prompt, picker)),
            None => ContentProvider::embedded(picker),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    if cli.history {
        return print_history(&mut io::stdout(), &HistoryLog::new(), &FileScoreStore::new());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let settings_store = FileSettingsStore::new();
    let stored = settings_store.load();
    let settings = cli.apply(stored);

    let feedback: Box<dyn FeedbackPlayer> = if settings.sound {
        Box::new(TerminalBell::stdout())
    } else {
        Box::new(Muted)
    };
    let session = SessionController::new(
        SessionConfig {
            mode: settings.mode,
            duration: settings.duration,
        },
        cli.content_provider()?,
        Box::new(FileScoreStore::new()),
        feedback,
    )?
    .with_history(HistoryLog::new());

    // --mute only applies to this run
    let mut app = App::new(
        session,
        Settings {
            sound: stored.sound,
            ..settings
        },
    )
    .with_settings_store(Box::new(settings_store));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut renderer = TerminalRenderer::new(Terminal::new(backend)?);

    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let res = app::run(&mut app, &mut renderer, &mut runner);

    disable_raw_mode()?;
    let terminal = renderer.terminal_mut();
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(e) = &res {
        log::error!("session aborted: {e}");
    }
    Ok(res?)
}

/// Routes `log` output to a file; the terminal belongs to the UI.
fn init_logging() {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Pipe(Box::new(file)))
        .try_init();
}

fn print_history<W: Write>(
    out: &mut W,
    log: &HistoryLog,
    scores: &dyn ScoreStore,
) -> Result<(), Box<dyn Error>> {
    writeln!(out, "best: {} wpm", scores.read_best_score())?;

    let records = log.recent(HISTORY_ROWS)?;
    if records.is_empty() {
        writeln!(out, "no attempts yet")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<17} {:<6} {:>5} {:>5} {:>5} {:>9}",
        "date", "mode", "time", "wpm", "acc", "mistakes"
    )?;
    for r in records {
        writeln!(
            out,
            "{:<17} {:<6} {:>5} {:>5} {:>4}% {:>9}",
            r.date.format("%Y-%m-%d %H:%M").to_string(),
            r.mode.to_string(),
            format!("{}s", r.duration_secs),
            r.wpm,
            r.accuracy,
            r.mistakes
        )?;
    }
    Ok(())
}
