use super::*;

#[derive(Debug, Clone, Default)]
pub(crate) struct BookTexts {
    pub pali: String,
    pub english: Option<String>,
    pub sinhala: Option<String>,
}

impl BookTexts {
    pub(crate) fn get(&self, language: Language) -> Option<&str> {
        match language {
            Language::Pali => Some(self.pali.as_str()),
            Language::English => self.english.as_deref(),
            Language::Sinhala => self.sinhala.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SegmentedChapter {
    pub chapter: Chapter,
    pub issues: Vec<(IssueKind, String)>,
    pub ignored_lines: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MergedChannels {
    pub title: LangText,
    pub footer: Option<LangText>,
    pub sections: Vec<Section>,
    pub dropped: Vec<(Language, u32)>,
}

pub(crate) fn merge_channels(
    pali: &ChannelSegments,
    secondary: &[(Language, ChannelSegments)],
) -> MergedChannels {
    let mut merged = MergedChannels::default();
    merged.title.pali = pali.title.clone();

    let mut index = HashMap::<(u32, usize), usize>::new();
    let mut occurrences = HashMap::<u32, usize>::new();
    for channel_section in &pali.sections {
        let occurrence = next_occurrence(&mut occurrences, channel_section.number);
        index.insert((channel_section.number, occurrence), merged.sections.len());

        let mut section = Section {
            number: channel_section.number,
            number_range: channel_section.number_range.clone(),
            ..Section::default()
        };
        apply_channel(&mut section, Language::Pali, channel_section);
        section.absorbed = channel_section
            .absorbed
            .iter()
            .map(|(number, title)| AbsorbedPart {
                number: *number,
                title: LangText {
                    pali: title.clone(),
                    ..LangText::default()
                },
            })
            .collect();
        merged.sections.push(section);
    }

    let mut footer = LangText {
        pali: pali.footer.join("\n"),
        ..LangText::default()
    };

    for (language, segments) in secondary {
        *merged.title.get_mut(*language) = segments.title.clone();
        *footer.get_mut(*language) = segments.footer.join("\n");

        let mut occurrences = HashMap::<u32, usize>::new();
        for channel_section in &segments.sections {
            let occurrence = next_occurrence(&mut occurrences, channel_section.number);
            let Some(position) = index.get(&(channel_section.number, occurrence)) else {
                merged.dropped.push((*language, channel_section.number));
                continue;
            };

            let section = &mut merged.sections[*position];
            apply_channel(section, *language, channel_section);
            for (number, title) in &channel_section.absorbed {
                match section.absorbed.iter_mut().find(|part| part.number == *number) {
                    Some(part) => *part.title.get_mut(*language) = title.clone(),
                    None => debug!(
                        number = *number,
                        channel = language.as_str(),
                        "absorbed heading has no pali counterpart"
                    ),
                }
            }
        }
    }

    merged.footer = (!footer.is_empty()).then_some(footer);
    merged
}

fn next_occurrence(occurrences: &mut HashMap<u32, usize>, number: u32) -> usize {
    let counter = occurrences.entry(number).or_insert(0);
    let occurrence = *counter;
    *counter += 1;
    occurrence
}

fn apply_channel(section: &mut Section, language: Language, channel_section: &ChannelSection) {
    section.set_title(language, channel_section.title.clone());
    section.set_vagga(language, channel_section.vagga.clone());
    *section.body_mut(language) = channel_section.body.join("\n");
}

pub(crate) fn slugify(text: &str) -> String {
    text.chars()
        .map(fold_diacritic)
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else if ch.is_whitespace() || ch == '-' || ch == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&ch| ch != '\0')
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn fold_diacritic(ch: char) -> char {
    match ch {
        'ā' | 'Ā' | 'à' | 'á' | 'â' | 'ä' => 'a',
        'ī' | 'Ī' | 'ì' | 'í' | 'î' | 'ï' => 'i',
        'ū' | 'Ū' | 'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ē' | 'è' | 'é' | 'ê' | 'ë' => 'e',
        'ō' | 'ò' | 'ó' | 'ô' | 'ö' => 'o',
        'ṃ' | 'ṁ' | 'Ṃ' | 'Ṁ' => 'm',
        'ṅ' | 'ñ' | 'ṇ' | 'Ṅ' | 'Ñ' | 'Ṇ' => 'n',
        'ṭ' | 'Ṭ' => 't',
        'ḍ' | 'Ḍ' => 'd',
        'ḷ' | 'Ḷ' | 'ḹ' => 'l',
        'ṛ' | 'ṝ' | 'Ṛ' => 'r',
        'ś' | 'ṣ' | 'Ś' | 'Ṣ' => 's',
        'ḥ' | 'Ḥ' => 'h',
        other => other,
    }
}

pub(crate) fn chapter_id(
    normalizer: &TextNormalizer,
    book: &str,
    entry: &ChapterEntry,
    pali_title: &str,
    position: usize,
) -> String {
    if let Some(id) = entry.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        return id.to_string();
    }

    let mut slug = slugify(&normalizer.canonical(pali_title));
    if slug.is_empty() {
        slug = slugify(&normalizer.canonical(&entry.marker.pali));
    }
    if slug.is_empty() {
        slug = format!("chapter-{}", position + 1);
    }
    format!("{book}-{slug}")
}

pub(crate) fn segment_chapter(
    classifier: &LineClassifier,
    texts: &BookTexts,
    book: &str,
    entry: &ChapterEntry,
    next: Option<&ChapterEntry>,
    position: usize,
    segmenter: &SegmenterConfig,
) -> Result<SegmentedChapter, PipelineError> {
    let mut issues = Vec::new();

    let pali_block = extract_chapter_block(
        &texts.pali,
        &entry.marker.pali,
        next.map(|next| next.marker.pali.as_str()),
        Language::Pali,
    )?;
    let pali = segment_channel(classifier, &pali_block);
    let mut ignored_lines = pali.ignored_lines;

    let mut secondary = Vec::new();
    for language in [Language::English, Language::Sinhala] {
        let Some(text) = texts.get(language) else {
            continue;
        };
        let marker = entry
            .marker
            .get(language)
            .unwrap_or(entry.marker.pali.as_str());
        let next_marker =
            next.map(|next| next.marker.get(language).unwrap_or(next.marker.pali.as_str()));

        match extract_chapter_block(text, marker, next_marker, language) {
            Ok(block) => {
                let segments = segment_channel(classifier, &block);
                ignored_lines += segments.ignored_lines;
                secondary.push((language, segments));
            }
            Err(err) => issues.push((err.kind(), err.to_string())),
        }
    }

    let merged = merge_channels(&pali, &secondary);
    for (language, number) in &merged.dropped {
        issues.push((
            IssueKind::ChannelDivergence,
            format!(
                "{} section {number} has no pali counterpart and was dropped",
                language.as_str()
            ),
        ));
    }

    if let Some(expected) = entry.expected_sections {
        let found = merged.sections.len();
        let allowed = (expected as f64 * segmenter.count_divergence_ratio).floor() as usize;
        if found.abs_diff(expected) > allowed {
            issues.push((
                IssueKind::SectionCountDivergence,
                format!("expected {expected} sections, segmented {found}"),
            ));
        }
    }

    let duplicates = pali.duplicate_numbers();
    if duplicates > 0 {
        debug!(book = %book, duplicates, "segmented duplicate section numbers");
    }

    let chapter = Chapter {
        id: chapter_id(classifier.normalizer(), book, entry, &merged.title.pali, position),
        title: merged.title,
        footer: merged.footer,
        sections: merged.sections,
    };

    Ok(SegmentedChapter {
        chapter,
        issues,
        ignored_lines,
    })
}
