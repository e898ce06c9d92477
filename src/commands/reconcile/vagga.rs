use super::*;

type VaggaTriple = (Option<String>, Option<String>, Option<String>);

fn vagga_triple(section: &Section) -> VaggaTriple {
    (
        section.vagga.clone(),
        section.vagga_english.clone(),
        section.vagga_sinhala.clone(),
    )
}

pub(crate) fn dedup_vaggas(sections: &mut [Section]) -> usize {
    let mut previous: Option<VaggaTriple> = None;
    let mut cleared = 0usize;

    for section in sections.iter_mut() {
        if !section.has_vagga() {
            previous = None;
            continue;
        }

        let current = vagga_triple(section);
        if previous.as_ref() == Some(&current) {
            section.clear_vagga();
            cleared += 1;
        }
        previous = Some(current);
    }

    cleared
}
