use crate::error::{Error, Result};
use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::from_str;

static POOL_DIR: Dir = include_dir!("src/pools");

/// Which pool of passages an attempt draws from
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Prose,
    Code,
}

impl Mode {
    pub fn toggle(self) -> Self {
        match self {
            Mode::Prose => Mode::Code,
            Mode::Code => Mode::Prose,
        }
    }
}

/// The passage being typed during one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetText {
    text: String,
    chars: Vec<char>,
}

impl TargetText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars = text.chars().collect();
        Self { text, chars }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TextPool {
    pub name: String,
    pub texts: Vec<String>,
}

impl TextPool {
    pub fn embedded(mode: Mode) -> Result<Self> {
        read_pool_from_file(&format!("{mode}.json"))
    }
}

fn read_pool_from_file(file_name: &str) -> Result<TextPool> {
    let malformed = |reason: &str| Error::MalformedPool {
        name: file_name.to_string(),
        reason: reason.to_string(),
    };

    let file = POOL_DIR
        .get_file(file_name)
        .ok_or_else(|| malformed("file not found"))?;
    let contents = file
        .contents_utf8()
        .ok_or_else(|| malformed("not valid utf-8"))?;

    Ok(from_str(contents)?)
}

/// Source of uniformly distributed indices used to pick a passage
pub trait IndexSource {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// Index source backed by any `rand` generator
pub struct RandomIndex<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomIndex<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomIndex<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> IndexSource for RandomIndex<R> {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Supplies a passage for a given mode
pub struct ContentProvider {
    prose: TextPool,
    code: TextPool,
    picker: Box<dyn IndexSource>,
}

impl ContentProvider {
    pub fn new(prose: TextPool, code: TextPool, picker: Box<dyn IndexSource>) -> Self {
        Self {
            prose,
            code,
            picker,
        }
    }

    /// Provider over the passages compiled into the binary
    pub fn embedded(picker: Box<dyn IndexSource>) -> Result<Self> {
        Ok(Self::new(
            TextPool::embedded(Mode::Prose)?,
            TextPool::embedded(Mode::Code)?,
            picker,
        ))
    }

    /// Provider that always hands out `prompt`, whatever the mode
    pub fn custom(prompt: &str, picker: Box<dyn IndexSource>) -> Self {
        let pool = |name: &str| TextPool {
            name: name.to_string(),
            texts: vec![prompt.to_string()],
        };
        Self::new(pool("prose"), pool("code"), picker)
    }

    pub fn pool(&self, mode: Mode) -> &TextPool {
        match mode {
            Mode::Prose => &self.prose,
            Mode::Code => &self.code,
        }
    }

    pub fn select_text(&mut self, mode: Mode) -> Result<TargetText> {
        let texts = match mode {
            Mode::Prose => &self.prose.texts,
            Mode::Code => &self.code.texts,
        };
        if texts.is_empty() {
            return Err(Error::EmptyPool(mode));
        }

        let idx = self.picker.pick(texts.len()).min(texts.len() - 1);
        let text = TargetText::new(texts[idx].clone());
        if text.is_empty() {
            return Err(Error::EmptyPool(mode));
        }

        log::debug!("selected {mode} passage #{idx} ({} chars)", text.len());
        Ok(text)
    }
}
