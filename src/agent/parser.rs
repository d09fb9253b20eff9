// src/agent/parser.rs — Parse reflection responses into structured scores

use crate::core::types::{DimensionScore, ReflectionResult};
use crate::infra::errors::ResearchError;

/// Completeness dimensions the reflection prompt asks the model to score.
pub const DIMENSIONS: [&str; 4] = ["descriptive", "explanatory", "evidential", "actionability"];

/// Parse a reflection response into a typed result.
///
/// Expected format:
/// ```text
/// SCORES:
/// descriptive: 0.8
/// explanatory: 0.6
/// evidential: 0.7
/// actionability: 0.5
/// ANALYSIS:
/// free-form text
/// ```
/// Only the names in [`DIMENSIONS`] are scored (case-insensitive); other
/// score lines are ignored. The overall score is the equal-weight mean of the
/// four. A response missing any of them is an error; no default score is
/// invented.
pub fn parse_reflection(response: &str) -> Result<ReflectionResult, ResearchError> {
    let mut dimensions: Vec<DimensionScore> = Vec::new();
    let mut analysis_lines: Vec<&str> = Vec::new();
    let mut saw_analysis_header = false;
    let mut section = Section::None;

    for line in response.lines() {
        let trimmed = line.trim();
        let header = trimmed.trim_matches(|c| c == '*' || c == '#').trim();

        if header.eq_ignore_ascii_case("SCORES:") || header.eq_ignore_ascii_case("Scores") {
            section = Section::Scores;
            continue;
        }
        if let Some(rest) = strip_prefix_ignore_case(header, "ANALYSIS:") {
            section = Section::Analysis;
            saw_analysis_header = true;
            let rest = rest.trim().trim_start_matches('*').trim();
            if !rest.is_empty() {
                analysis_lines.push(rest);
            }
            continue;
        }

        match section {
            Section::Scores => {
                if let Some((name, score)) = parse_score_line(trimmed) {
                    let known = DIMENSIONS.contains(&name.as_str());
                    if known && !dimensions.iter().any(|d| d.dimension == name) {
                        dimensions.push(DimensionScore {
                            dimension: name,
                            score,
                            weight: 1.0,
                        });
                    }
                }
            }
            Section::Analysis => analysis_lines.push(line.trim_end()),
            Section::None => {}
        }
    }

    let analysis = if saw_analysis_header {
        analysis_lines.join("\n").trim().to_string()
    } else {
        response.trim().to_string()
    };

    let missing: Vec<&str> = DIMENSIONS
        .iter()
        .copied()
        .filter(|name| !dimensions.iter().any(|d| d.dimension == *name))
        .collect();
    if !missing.is_empty() {
        return Err(ResearchError::InvalidReflection(format!(
            "missing dimension scores: {}",
            missing.join(", ")
        )));
    }

    // Report dimensions in prompt order
    dimensions.sort_by_key(|d| DIMENSIONS.iter().position(|n| *n == d.dimension));
    let weight = 1.0 / DIMENSIONS.len() as f32;
    for d in &mut dimensions {
        d.weight = weight;
    }

    ReflectionResult::from_dimensions(dimensions, analysis)
        .ok_or_else(|| ResearchError::InvalidReflection("no dimension scores found".into()))
}

enum Section {
    None,
    Scores,
    Analysis,
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s.is_char_boundary(prefix.len()) {
        let (head, tail) = s.split_at(prefix.len());
        if head.eq_ignore_ascii_case(prefix) {
            return Some(tail);
        }
    }
    None
}

/// Parse a line like "descriptive: 0.85", "- **evidential**: 0.7",
/// "2. Explanatory: 0.6" or "actionability: 0.6/1". Names are lowercased;
/// scores must be in [0, 1].
pub(crate) fn parse_score_line(line: &str) -> Option<(String, f32)> {
    let line = strip_list_marker(line.trim());
    let (name, score_str) = line.split_once(':')?;
    let name = name.trim().trim_matches('*').trim().to_lowercase();
    if name.is_empty() {
        return None;
    }

    let score_str = score_str.trim().trim_matches('*').trim();
    let score_str = score_str.strip_suffix("/1").unwrap_or(score_str).trim();
    let score: f32 = score_str.parse().ok()?;

    if !(0.0..=1.0).contains(&score) {
        return None;
    }

    Some((name, score))
}

/// Drop a leading bullet or list number ("- ", "* ", "1. ", "2) ").
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim_start_matches(['-', '*', ' ']);
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        if let Some(rest) = line[digits..]
            .strip_prefix('.')
            .or_else(|| line[digits..].strip_prefix(')'))
        {
            return rest.trim_start_matches(['-', '*', ' ']).trim();
        }
    }
    line.trim()
}
