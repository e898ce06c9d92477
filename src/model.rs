use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Pali,
    English,
    Sinhala,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Pali, Language::English, Language::Sinhala];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pali => "pali",
            Self::English => "english",
            Self::Sinhala => "sinhala",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangText {
    #[serde(default)]
    pub pali: String,
    #[serde(default)]
    pub english: String,
    #[serde(default)]
    pub sinhala: String,
}

impl LangText {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Pali => &self.pali,
            Language::English => &self.english,
            Language::Sinhala => &self.sinhala,
        }
    }

    pub fn get_mut(&mut self, language: Language) -> &mut String {
        match language {
            Language::Pali => &mut self.pali,
            Language::English => &mut self.english,
            Language::Sinhala => &mut self.sinhala,
        }
    }

    pub fn is_empty(&self) -> bool {
        Language::ALL
            .iter()
            .all(|language| self.get(*language).trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    #[serde(default)]
    pub title: LangText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<LangText>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Chapter {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let raw = fs::read_to_string(path).map_err(|err| PipelineError::malformed(path, err))?;
        let chapter: Chapter =
            serde_json::from_str(&raw).map_err(|err| PipelineError::malformed(path, err))?;
        chapter
            .validate()
            .map_err(|reason| PipelineError::malformed(path, reason))?;
        Ok(chapter)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("chapter id is empty".to_string());
        }

        for (index, section) in self.sections.iter().enumerate() {
            if section.number == 0 {
                return Err(format!("section at index {index} has number 0"));
            }
            if let Some(range) = section.number_range.as_deref() {
                range
                    .parse::<NumberRange>()
                    .map_err(|reason| format!("section {}: {reason}", section.number))?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vagga: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vagga_english: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vagga_sinhala: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pali_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sinhala_title: Option<String>,
    #[serde(default)]
    pub pali: String,
    #[serde(default)]
    pub english: String,
    #[serde(default)]
    pub sinhala: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub absorbed: Vec<AbsorbedPart>,
}

impl Section {
    pub fn title(&self, language: Language) -> Option<&str> {
        match language {
            Language::Pali => self.pali_title.as_deref(),
            Language::English => self.english_title.as_deref(),
            Language::Sinhala => self.sinhala_title.as_deref(),
        }
    }

    pub fn set_title(&mut self, language: Language, value: Option<String>) {
        let value = value.filter(|text| !text.trim().is_empty());
        match language {
            Language::Pali => self.pali_title = value,
            Language::English => self.english_title = value,
            Language::Sinhala => self.sinhala_title = value,
        }
    }

    pub fn vagga_for(&self, language: Language) -> Option<&str> {
        match language {
            Language::Pali => self.vagga.as_deref(),
            Language::English => self.vagga_english.as_deref(),
            Language::Sinhala => self.vagga_sinhala.as_deref(),
        }
    }

    pub fn set_vagga(&mut self, language: Language, value: Option<String>) {
        let value = value.filter(|text| !text.trim().is_empty());
        match language {
            Language::Pali => self.vagga = value,
            Language::English => self.vagga_english = value,
            Language::Sinhala => self.vagga_sinhala = value,
        }
    }

    pub fn has_vagga(&self) -> bool {
        Language::ALL
            .iter()
            .any(|language| self.vagga_for(*language).is_some())
    }

    pub fn clear_vagga(&mut self) {
        self.vagga = None;
        self.vagga_english = None;
        self.vagga_sinhala = None;
    }

    pub fn body(&self, language: Language) -> &str {
        match language {
            Language::Pali => &self.pali,
            Language::English => &self.english,
            Language::Sinhala => &self.sinhala,
        }
    }

    pub fn body_mut(&mut self, language: Language) -> &mut String {
        match language {
            Language::Pali => &mut self.pali,
            Language::English => &mut self.english,
            Language::Sinhala => &mut self.sinhala,
        }
    }

    pub fn display_title(&self) -> &str {
        Language::ALL
            .iter()
            .find_map(|language| self.title(*language))
            .unwrap_or("")
    }

    pub fn range(&self) -> Option<NumberRange> {
        self.number_range
            .as_deref()
            .and_then(|value| value.parse::<NumberRange>().ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsorbedPart {
    pub number: u32,
    #[serde(default)]
    pub title: LangText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberRange {
    pub start: u32,
    pub end: u32,
}

impl NumberRange {
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, number: u32) -> bool {
        (self.start..=self.end).contains(&number)
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for NumberRange {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| format!("range '{value}' is not of the form start-end"))?;
        if start.is_empty()
            || end.is_empty()
            || !start.bytes().all(|byte| byte.is_ascii_digit())
            || !end.bytes().all(|byte| byte.is_ascii_digit())
        {
            return Err(format!("range '{value}' must match ^\\d+-\\d+$"));
        }

        let start = start
            .parse::<u32>()
            .map_err(|err| format!("range '{value}' start: {err}"))?;
        let end = end
            .parse::<u32>()
            .map_err(|err| format!("range '{value}' end: {err}"))?;
        NumberRange::new(start, end).ok_or_else(|| format!("range '{value}' has start > end"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookManifest {
    pub collection: String,
    pub book: String,
    #[serde(default)]
    pub title: Option<String>,
    pub sources: ChannelSources,
    pub chapters: Vec<ChapterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSources {
    pub pali: PathBuf,
    #[serde(default)]
    pub english: Option<PathBuf>,
    #[serde(default)]
    pub sinhala: Option<PathBuf>,
}

impl ChannelSources {
    pub fn get(&self, language: Language) -> Option<&PathBuf> {
        match language {
            Language::Pali => Some(&self.pali),
            Language::English => self.english.as_ref(),
            Language::Sinhala => self.sinhala.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub marker: ChapterMarker,
    #[serde(default)]
    pub expected_sections: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterMarker {
    pub pali: String,
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub sinhala: Option<String>,
}

impl ChapterMarker {
    pub fn get(&self, language: Language) -> Option<&str> {
        match language {
            Language::Pali => Some(self.pali.as_str()),
            Language::English => self.english.as_deref(),
            Language::Sinhala => self.sinhala.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_range_parses_and_rejects_inverted_bounds() {
        let range: NumberRange = "102-109".parse().expect("range should parse");
        assert_eq!(range, NumberRange { start: 102, end: 109 });
        assert_eq!(range.to_string(), "102-109");
        assert!("109-102".parse::<NumberRange>().is_err());
        assert!("102–109".parse::<NumberRange>().is_err());
        assert!("a-3".parse::<NumberRange>().is_err());
    }

    #[test]
    fn section_uses_camel_case_document_keys() {
        let raw = r#"{ "number": 3, "numberRange": "3-4", "paliTitle": "Dutiyasuttaṃ", "pali": "x" }"#;
        let section: Section = serde_json::from_str(raw).expect("section should deserialize");
        assert_eq!(section.number, 3);
        assert_eq!(section.pali_title.as_deref(), Some("Dutiyasuttaṃ"));
        assert_eq!(section.english, "");

        let value = serde_json::to_value(&section).expect("section should serialize");
        assert!(value.get("absorbed").is_none());
        assert!(value.get("vagga").is_none());
        assert_eq!(value["numberRange"], "3-4");
    }

    #[test]
    fn load_rejects_zero_numbers_and_bad_ranges() {
        let temp = tempfile::tempdir().expect("tempdir");

        let zero = temp.path().join("zero.json");
        fs::write(&zero, r#"{ "id": "mn-x", "sections": [ { "number": 0 } ] }"#)
            .expect("write zero");
        let error = Chapter::load(&zero).expect_err("number 0 should be rejected");
        assert!(error.to_string().contains("number 0"));

        let range = temp.path().join("range.json");
        fs::write(
            &range,
            r#"{ "id": "mn-x", "sections": [ { "number": 4, "numberRange": "9-4" } ] }"#,
        )
        .expect("write range");
        assert!(Chapter::load(&range).is_err());

        let good = temp.path().join("good.json");
        fs::write(
            &good,
            r#"{ "id": "mn-x", "title": { "pali": "Mūlapariyāyavaggo" }, "sections": [ { "number": 1, "pali": "Evaṃ" } ] }"#,
        )
        .expect("write good");
        let chapter = Chapter::load(&good).expect("valid chapter should load");
        assert_eq!(chapter.sections.len(), 1);
        assert_eq!(chapter.title.english, "");
    }
}
