use super::*;

fn is_marker_line(line: &str, marker: &str) -> bool {
    let marker = fold(marker.trim());
    if marker.is_empty() {
        return false;
    }

    let trimmed = line.trim_start();
    let rest = trimmed.trim_start_matches(|ch: char| ch.is_ascii_digit());
    if rest.len() == trimmed.len() {
        return false;
    }

    match rest.strip_prefix('.') {
        Some(content) if content.starts_with(char::is_whitespace) => {
            fold(content.trim_start()).starts_with(&marker)
        }
        _ => false,
    }
}

pub(crate) fn extract_chapter_block<'a>(
    text: &'a str,
    marker: &str,
    next_marker: Option<&str>,
    channel: Language,
) -> Result<Vec<&'a str>, PipelineError> {
    let lines = text.lines().collect::<Vec<&str>>();

    let start = lines
        .iter()
        .position(|line| is_marker_line(line, marker))
        .ok_or_else(|| PipelineError::MissingChapterMarker {
            marker: marker.to_string(),
            channel,
        })?;

    let end = next_marker
        .and_then(|next| {
            lines[start + 1..]
                .iter()
                .position(|line| is_marker_line(line, next))
                .map(|offset| start + 1 + offset)
        })
        .unwrap_or(lines.len());

    Ok(lines[start..end].to_vec())
}
