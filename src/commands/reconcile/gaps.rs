use super::*;

pub(crate) fn find_gaps(sections: &[Section]) -> Vec<NumberRange> {
    let mut covered = sections
        .iter()
        .map(|section| match section.range() {
            Some(range) => NumberRange {
                start: range.start.min(section.number),
                end: range.end.max(section.number),
            },
            None => NumberRange {
                start: section.number,
                end: section.number,
            },
        })
        .collect::<Vec<NumberRange>>();
    covered.sort_by_key(|range| (range.start, range.end));

    let mut gaps = Vec::new();
    let mut reached: Option<u32> = None;
    for range in covered {
        if let Some(last) = reached {
            if range.start > last.saturating_add(1) {
                gaps.push(NumberRange {
                    start: last + 1,
                    end: range.start - 1,
                });
            }
        }
        reached = Some(reached.map_or(range.end, |last| last.max(range.end)));
    }

    gaps
}
