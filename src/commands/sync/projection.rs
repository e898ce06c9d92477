use super::*;

pub(crate) const SECTION_FIELDS: [&str; 10] = [
    "number_range",
    "vagga",
    "vagga_english",
    "vagga_sinhala",
    "pali_title",
    "english_title",
    "sinhala_title",
    "pali",
    "english",
    "sinhala",
];

pub(crate) const CHAPTER_FIELDS: [&str; 6] = [
    "title_pali",
    "title_english",
    "title_sinhala",
    "footer_pali",
    "footer_english",
    "footer_sinhala",
];

fn present(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn present_opt(value: Option<&str>) -> Option<String> {
    value.and_then(present)
}

fn cell_text(row: &[Cell], index: usize) -> Option<String> {
    row.get(index)
        .and_then(Cell::as_text)
        .filter(|text| !text.is_empty())
}

fn diff<const N: usize>(
    names: &[&'static str; N],
    left: &[Option<String>; N],
    right: &[Option<String>; N],
) -> Vec<&'static str> {
    names
        .iter()
        .zip(left.iter().zip(right.iter()))
        .filter(|(_, (left, right))| left != right)
        .map(|(name, _)| *name)
        .collect()
}

fn fingerprint_of(values: &[Option<String>]) -> String {
    sha256_hex(values.iter().map(|value| value.as_deref().unwrap_or("")))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SectionProjection {
    values: [Option<String>; 10],
}

impl SectionProjection {
    pub(crate) fn from_section(section: &Section) -> Self {
        Self {
            values: [
                present_opt(section.number_range.as_deref()),
                present_opt(section.vagga.as_deref()),
                present_opt(section.vagga_english.as_deref()),
                present_opt(section.vagga_sinhala.as_deref()),
                present_opt(section.pali_title.as_deref()),
                present_opt(section.english_title.as_deref()),
                present_opt(section.sinhala_title.as_deref()),
                present(&section.pali),
                present(&section.english),
                present(&section.sinhala),
            ],
        }
    }

    pub(crate) fn from_row(row: &[Cell]) -> Self {
        Self {
            values: std::array::from_fn(|index| cell_text(row, index)),
        }
    }

    pub(crate) fn cells(&self) -> Vec<Cell> {
        self.values
            .iter()
            .map(|value| Cell::optional_text(value.as_deref()))
            .collect()
    }

    pub(crate) fn fingerprint(&self) -> String {
        fingerprint_of(&self.values)
    }

    pub(crate) fn diff_fields(&self, other: &SectionProjection) -> Vec<&'static str> {
        diff(&SECTION_FIELDS, &self.values, &other.values)
    }

    #[cfg(test)]
    pub(crate) fn into_section(self, number: u32) -> Section {
        let [
            number_range,
            vagga,
            vagga_english,
            vagga_sinhala,
            pali_title,
            english_title,
            sinhala_title,
            pali,
            english,
            sinhala,
        ] = self.values;
        Section {
            number,
            number_range,
            vagga,
            vagga_english,
            vagga_sinhala,
            pali_title,
            english_title,
            sinhala_title,
            pali: pali.unwrap_or_default(),
            english: english.unwrap_or_default(),
            sinhala: sinhala.unwrap_or_default(),
            absorbed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ChapterProjection {
    values: [Option<String>; 6],
}

impl ChapterProjection {
    pub(crate) fn from_chapter(chapter: &Chapter) -> Self {
        let footer = chapter.footer.clone().unwrap_or_default();
        Self {
            values: [
                present(&chapter.title.pali),
                present(&chapter.title.english),
                present(&chapter.title.sinhala),
                present(&footer.pali),
                present(&footer.english),
                present(&footer.sinhala),
            ],
        }
    }

    pub(crate) fn from_row(row: &[Cell]) -> Self {
        Self {
            values: std::array::from_fn(|index| cell_text(row, index)),
        }
    }

    pub(crate) fn cells(&self) -> Vec<Cell> {
        self.values
            .iter()
            .map(|value| Cell::optional_text(value.as_deref()))
            .collect()
    }

    pub(crate) fn diff_fields(&self, other: &ChapterProjection) -> Vec<&'static str> {
        diff(&CHAPTER_FIELDS, &self.values, &other.values)
    }
}
