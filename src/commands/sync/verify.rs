use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Mismatch {
    pub key: String,
    pub missing: bool,
    pub fields: Vec<&'static str>,
}

impl Mismatch {
    pub(crate) fn describe(&self) -> String {
        if self.missing {
            format!("{} has no stored row", self.key)
        } else {
            format!("{} differs in {}", self.key, self.fields.join(", "))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Verification {
    pub checked: usize,
    pub mismatches: Vec<Mismatch>,
    pub stored_numbers: Vec<u32>,
}

pub(crate) fn sample_keys(keys: &[u32], count: usize) -> Vec<u32> {
    if count == 0 {
        return Vec::new();
    }
    if count >= keys.len() {
        return keys.to_vec();
    }

    (0..count).map(|step| keys[step * keys.len() / count]).collect()
}

pub(crate) fn verify_sections(
    store: &mut dyn Store,
    chapter: &Chapter,
    numbers: &[u32],
) -> Result<Verification> {
    let snapshot = load_snapshot(store, &chapter.id)?;
    let mut verification = Verification {
        stored_numbers: snapshot.sections.keys().copied().collect(),
        ..Verification::default()
    };

    let expected_chapter = ChapterProjection::from_chapter(chapter);
    match &snapshot.chapter {
        Some(stored) if *stored == expected_chapter => {}
        Some(stored) => verification.mismatches.push(Mismatch {
            key: chapter.id.clone(),
            missing: false,
            fields: expected_chapter.diff_fields(stored),
        }),
        None => verification.mismatches.push(Mismatch {
            key: chapter.id.clone(),
            missing: true,
            fields: Vec::new(),
        }),
    }

    let wanted = numbers.iter().copied().collect::<BTreeSet<u32>>();
    for section in chapter
        .sections
        .iter()
        .filter(|section| wanted.contains(&section.number))
    {
        verification.checked += 1;
        let key = section_key(&chapter.id, section.number);
        let expected = SectionProjection::from_section(section);

        match snapshot.sections.get(&section.number) {
            Some(stored) if *stored == expected => {}
            Some(stored) => verification.mismatches.push(Mismatch {
                key,
                missing: false,
                fields: expected.diff_fields(stored),
            }),
            None => verification.mismatches.push(Mismatch {
                key,
                missing: true,
                fields: Vec::new(),
            }),
        }
    }

    Ok(verification)
}
