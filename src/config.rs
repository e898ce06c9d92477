use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::info;

use crate::cli::VerifyMode;

pub const CONFIG_FILENAME: &str = "pipeline.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub rules: SuffixRules,
    pub segmenter: SegmenterConfig,
    pub sync: SyncConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rules: SuffixRules::default(),
            segmenter: SegmenterConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn resolve(explicit: Option<&Path>, corpus_root: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let implicit = corpus_root.join(CONFIG_FILENAME);
        if implicit.exists() {
            return Self::load(&implicit);
        }

        Ok(Self::default())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: PipelineConfig = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;

        info!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.rules.title_suffixes.is_empty() {
            bail!("rules.title_suffixes must not be empty");
        }
        if self.sync.batch_size == 0 {
            bail!("sync.batch_size must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.segmenter.count_divergence_ratio) {
            bail!(
                "segmenter.count_divergence_ratio must be within [0, 1], got {}",
                self.segmenter.count_divergence_ratio
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuffixRules {
    pub title_suffixes: Vec<String>,
    pub vagga_suffixes: Vec<String>,
    pub footer_suffixes: Vec<String>,
    pub title_max_chars: usize,
    pub vagga_max_chars: usize,
    pub footer_max_chars: usize,
}

impl Default for SuffixRules {
    fn default() -> Self {
        Self {
            title_suffixes: to_strings(&[
                "suttaṃ",
                "suttam",
                "sutta",
                "suttāni",
                "suttantaṃ",
                "saṃyuttaṃ",
                "saṃyuttam",
                "discourse",
                "discourses",
                "සූත්‍රය",
                "සූත්‍ර",
                "සුත්තං",
            ]),
            vagga_suffixes: to_strings(&[
                "vaggo",
                "vagga",
                "vaggā",
                "peyyālo",
                "chapter",
                "division",
                "වර්ගය",
                "වග්ගො",
                "වග්ගෝ",
            ]),
            footer_suffixes: to_strings(&[
                "niṭṭhitaṃ",
                "niṭṭhitam",
                "niṭṭhito",
                "niṭṭhitā",
                "is finished",
                "is concluded",
                "නිමි",
                "නිමියි",
            ]),
            title_max_chars: 120,
            vagga_max_chars: 80,
            footer_max_chars: 160,
        }
    }
}

impl SuffixRules {
    pub fn is_title(&self, text: &str) -> bool {
        within_limit(text, self.title_max_chars) && ends_with_any(text, &self.title_suffixes)
    }

    pub fn is_vagga(&self, text: &str) -> bool {
        within_limit(text, self.vagga_max_chars) && ends_with_any(text, &self.vagga_suffixes)
    }

    /// Footer words usually sit mid-line ("… niṭṭhitaṃ paṭhamaṃ"), so they match anywhere.
    pub fn is_footer(&self, text: &str) -> bool {
        within_limit(text, self.footer_max_chars) && contains_any(text, &self.footer_suffixes)
    }
}

fn within_limit(text: &str, max_chars: usize) -> bool {
    let count = text.trim().chars().count();
    count > 0 && count <= max_chars
}

fn ends_with_any(text: &str, suffixes: &[String]) -> bool {
    let key = suffix_key(text);
    suffixes
        .iter()
        .any(|suffix| !suffix.is_empty() && key.ends_with(&fold(suffix)))
}

fn contains_any(text: &str, words: &[String]) -> bool {
    let key = suffix_key(text);
    words
        .iter()
        .any(|word| !word.is_empty() && key.contains(&fold(word)))
}

fn suffix_key(text: &str) -> String {
    fold(
        text.trim()
            .trim_end_matches(|ch: char| ch.is_whitespace() || ".,;:!?–—-\"'’”)".contains(ch)),
    )
}

/// Joiners are dropped on both sides so spellings with and without them compare equal.
pub(crate) fn fold(text: &str) -> String {
    text.chars()
        .filter(|ch| !matches!(ch, '\u{200C}' | '\u{200D}'))
        .collect::<String>()
        .to_lowercase()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub count_divergence_ratio: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            count_divergence_ratio: 0.25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub batch_size: usize,
    pub verify: VerifyMode,
    pub verify_sample: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            verify: VerifyMode::All,
            verify_sample: 20,
        }
    }
}
