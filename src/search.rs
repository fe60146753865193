use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};

/// Hard-splits a line into fixed-width segments plus a remainder.
/// A width of zero disables wrapping.
pub fn wrap_line(line: &str, width: u16) -> Vec<String> {
    if width == 0 {
        return vec![line.to_string()];
    }
    let chars = line.chars().collect::<Vec<_>>();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width as usize)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect()
}

/// Wraps a whole buffer to the target width, preserving existing line breaks.
pub fn wrap_text(content: &str, width: u16) -> String {
    content
        .split('\n')
        .flat_map(|line| wrap_line(line, width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Searches accumulated log content, returning only matching lines with the
/// matched portions styled. Lines are pre-wrapped to `width` before matching,
/// so a term split across a wrap boundary will not match.
pub fn search(content: &str, term: &str, strict: bool, width: u16, highlight: Style) -> Text<'static> {
    let lines = content.split('\n').collect::<Vec<_>>();
    if strict {
        strict_match(term, &lines, width, highlight)
    } else {
        fuzzy_match(term, &lines, width, highlight)
    }
}

/// Strict mode: a wrapped line group matches iff it contains the term as a
/// literal substring; every occurrence is highlighted.
fn strict_match(term: &str, lines: &[&str], width: u16, highlight: Style) -> Text<'static> {
    let mut out = Vec::new();
    for line in lines {
        let segments = wrap_line(line, width);
        let matches = term.is_empty() || segments.iter().any(|segment| segment.contains(term));
        if !matches {
            continue;
        }
        for segment in segments {
            out.push(highlight_occurrences(&segment, term, highlight));
        }
    }
    Text::from(out)
}

fn highlight_occurrences(segment: &str, term: &str, highlight: Style) -> Line<'static> {
    if term.is_empty() {
        return Line::from(segment.to_string());
    }
    let mut spans = Vec::new();
    let mut cursor = 0;
    for (start, matched) in segment.match_indices(term) {
        if start > cursor {
            spans.push(Span::raw(segment[cursor..start].to_string()));
        }
        spans.push(Span::styled(matched.to_string(), highlight));
        cursor = start + matched.len();
    }
    if cursor < segment.len() {
        spans.push(Span::raw(segment[cursor..].to_string()));
    }
    Line::from(spans)
}

/// Fuzzy mode: subsequence matching with per-character highlighting at the
/// matched positions. All matches are kept, ordered by descending score.
/// Empty-term behavior is whatever the matcher defines, deliberately not
/// special-cased here.
fn fuzzy_match(term: &str, lines: &[&str], width: u16, highlight: Style) -> Text<'static> {
    let matcher = SkimMatcherV2::default();
    let mut matches = Vec::new();
    for line in lines {
        let wrapped = wrap_line(line, width).join("\n");
        if let Some((score, indices)) = matcher.fuzzy_indices(&wrapped, term) {
            matches.push((score, wrapped, indices));
        }
    }
    matches.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = Vec::new();
    for (_, wrapped, indices) in matches {
        let mut spans = Vec::new();
        for (position, ch) in wrapped.chars().enumerate() {
            if ch == '\n' {
                out.push(Line::from(std::mem::take(&mut spans)));
                continue;
            }
            if indices.contains(&position) {
                spans.push(Span::styled(ch.to_string(), highlight));
            } else {
                spans.push(Span::raw(ch.to_string()));
            }
        }
        out.push(Line::from(spans));
    }
    Text::from(out)
}
