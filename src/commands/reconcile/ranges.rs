use super::*;

pub(crate) fn derive_ranges(sections: &mut [Section]) -> usize {
    let mut changed = 0usize;

    for section in sections.iter_mut() {
        if section.absorbed.is_empty() {
            continue;
        }

        let (mut start, mut end) = section
            .range()
            .map(|range| (range.start.min(section.number), range.end.max(section.number)))
            .unwrap_or((section.number, section.number));
        for part in &section.absorbed {
            start = start.min(part.number);
            end = end.max(part.number);
        }

        let range = NumberRange { start, end };
        section.number_range = Some(range.to_string());

        for language in Language::ALL {
            let mut titles = Vec::new();
            if let Some(own) = section.title(language) {
                titles.push(own.to_string());
            }
            for part in &section.absorbed {
                let title = part.title.get(language).trim();
                if !title.is_empty() {
                    titles.push(title.to_string());
                }
            }
            section.set_title(language, Some(titles.join("\n")));
        }

        section.absorbed.clear();
        changed += 1;
    }

    changed
}
