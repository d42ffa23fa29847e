// Library surface for the binary, headless tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod evaluator;
pub mod feedback;
pub mod history;
pub mod runtime;
pub mod score;
pub mod session;
pub mod stats;
pub mod ui;
