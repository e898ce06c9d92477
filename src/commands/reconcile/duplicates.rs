use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemovedSection {
    pub number: u32,
    pub title: String,
}

pub(crate) fn has_duplicates(sections: &[Section]) -> bool {
    let mut seen = HashSet::new();
    sections.iter().any(|section| !seen.insert(section.number))
}

pub(crate) fn remove_duplicates(sections: &mut Vec<Section>) -> Vec<RemovedSection> {
    let mut seen = HashSet::new();
    let mut removed = Vec::new();

    sections.retain(|section| {
        if seen.insert(section.number) {
            return true;
        }
        removed.push(RemovedSection {
            number: section.number,
            title: section.display_title().to_string(),
        });
        false
    });

    removed
}
