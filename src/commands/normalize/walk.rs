use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldContext {
    Plain,
    Sections,
    Section,
    Body,
}

pub(crate) fn normalize_value(
    normalizer: &TextNormalizer,
    value: &mut Value,
    stats: &mut NormalizeStats,
) {
    walk_value(normalizer, value, FieldContext::Plain, stats);
}

fn walk_value(
    normalizer: &TextNormalizer,
    value: &mut Value,
    context: FieldContext,
    stats: &mut NormalizeStats,
) {
    match value {
        Value::String(text) => {
            let normalized = normalizer.normalize_text(text, context == FieldContext::Body, stats);
            if normalized != *text {
                *text = normalized;
            }
        }
        Value::Array(items) => {
            let item_context = if context == FieldContext::Sections {
                FieldContext::Section
            } else {
                FieldContext::Plain
            };
            for item in items {
                walk_value(normalizer, item, item_context, stats);
            }
        }
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                let child_context = match (context, key.as_str()) {
                    (FieldContext::Plain, "sections") => FieldContext::Sections,
                    (FieldContext::Section, "pali" | "english" | "sinhala") => FieldContext::Body,
                    _ => FieldContext::Plain,
                };
                walk_value(normalizer, child, child_context, stats);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

pub(crate) fn normalize_chapter(
    normalizer: &TextNormalizer,
    chapter: &mut Chapter,
) -> Result<NormalizeStats> {
    let chapter_id = chapter.id.clone();
    let mut value = serde_json::to_value(&*chapter)
        .with_context(|| format!("failed to project chapter {chapter_id} for normalization"))?;

    let mut stats = NormalizeStats::default();
    normalize_value(normalizer, &mut value, &mut stats);

    if stats.total_fixes() > 0 {
        *chapter = serde_json::from_value(value)
            .with_context(|| format!("failed to rebuild chapter {chapter_id} after normalization"))?;
    }

    Ok(stats)
}
