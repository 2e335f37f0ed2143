//! Front-matter + section parsing. Never fails: a malformed front-matter
//! block is treated as absent and the whole buffer becomes body text of an
//! implicit level-0 document with no sections.

use kdd_core::{JsonMap, Section};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub front_matter: JsonMap,
    pub sections: Vec<Section>,
    /// Full body text (everything after the front-matter block, if any).
    pub body: String,
}

/// Parse an optional leading YAML front-matter block delimited by `---`
/// lines, then split the remaining text into an ordered list of sections.
pub fn parse(content: &str) -> ParsedDocument {
    let (front_matter, body) = split_front_matter(content);
    let sections = parse_sections(&body);
    ParsedDocument { front_matter, sections, body }
}

fn split_front_matter(content: &str) -> (JsonMap, String) {
    let trimmed_start = content.trim_start_matches('\u{feff}');
    let Some(rest) = trimmed_start.strip_prefix("---") else {
        return (JsonMap::new(), content.to_string());
    };
    // Require the opening delimiter to be alone on its line.
    let after_open = match rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) {
        Some(r) => r,
        None => return (JsonMap::new(), content.to_string()),
    };

    let Some(end_idx) = find_closing_delimiter(after_open) else {
        return (JsonMap::new(), content.to_string());
    };

    let (yaml_block, remainder) = after_open.split_at(end_idx);
    let body_start = remainder
        .find('\n')
        .map(|i| &remainder[i + 1..])
        .unwrap_or("");

    match serde_yaml::from_str::<serde_yaml::Value>(yaml_block) {
        Ok(value) => {
            let json = yaml_to_json(value);
            match json {
                Value::Object(map) => (map.into_iter().collect(), body_start.to_string()),
                _ => (JsonMap::new(), body_start.to_string()),
            }
        }
        Err(_) => (JsonMap::new(), content.to_string()),
    }
}

fn find_closing_delimiter(text: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed == "---" {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Walk the body line by line; a line beginning with 1-6 `#` followed by
/// whitespace opens a new section at that level, popping sibling/deeper
/// ancestors off the stack so each section's `path` is the dotted chain of
/// slugged ancestor headings.
pub fn parse_sections(body: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut stack: Vec<(u8, String)> = Vec::new(); // (level, slug)
    let mut current: Option<(String, u8, String, usize)> = None; // heading, level, path, body_start_line
    let mut lines: Vec<&str> = body.lines().collect();
    lines.push(""); // sentinel to flush the last section

    let mut body_lines: Vec<&str> = Vec::new();

    for line in lines {
        if let Some(level) = heading_level(line) {
            if let Some((heading, lvl, path, _)) = current.take() {
                sections.push(make_section(heading, lvl, path, &body_lines));
            }
            body_lines.clear();

            let heading_text = line.trim_start_matches('#').trim().to_string();
            let slug = anchor_slug(&heading_text);

            while stack.last().map(|(l, _)| *l >= level).unwrap_or(false) {
                stack.pop();
            }
            stack.push((level, slug));
            let path = stack
                .iter()
                .map(|(_, s)| s.as_str())
                .collect::<Vec<_>>()
                .join(".");

            current = Some((heading_text, level, path, 0));
        } else if current.is_some() {
            body_lines.push(line);
        }
    }

    sections
}

fn make_section(heading: String, level: u8, path: String, body_lines: &[&str]) -> Section {
    let raw = body_lines.join("\n");
    let body = raw.trim_matches('\n').trim().to_string();
    Section { heading, level, body, path }
}

fn heading_level(line: &str) -> Option<u8> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if rest.starts_with(' ') || rest.starts_with('\t') || rest.is_empty() {
        Some(hashes as u8)
    } else {
        None
    }
}

/// Unicode NFKD-normalize, lowercase, strip characters outside
/// `[A-Za-z0-9_-]`, collapse whitespace to `-`, trim leading/trailing `-`.
pub fn anchor_slug(text: &str) -> String {
    let normalized: String = text.nfkd().collect();
    let lowered = normalized.to_lowercase();

    let mut collapsed = String::with_capacity(lowered.len());
    let mut last_was_space = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                collapsed.push('-');
            }
            last_was_space = true;
        } else if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            collapsed.push(ch);
            last_was_space = false;
        }
        // everything else (diacritics stripped by NFKD decomposition,
        // punctuation, etc.) is dropped silently
    }

    collapsed.trim_matches('-').to_string()
}

/// Table-row helper: an aligned pipe-delimited table whose first
/// non-separator line is the header. Returns one map per row, keyed by
/// trimmed, back-tick-stripped header cell. Rows shorter than the header
/// are dropped.
pub fn parse_table_rows(body: &str) -> Vec<Vec<(String, String)>> {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('|'))
        .collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let header = split_row(lines[0]);
    let mut rows = Vec::new();

    for line in lines.iter().skip(1) {
        if is_separator_row(line) {
            continue;
        }
        let cells = split_row(line);
        if cells.len() < header.len() {
            continue;
        }
        let row = header
            .iter()
            .cloned()
            .zip(cells.into_iter())
            .collect::<Vec<_>>();
        rows.push(row);
    }

    rows
}

fn split_row(line: &str) -> Vec<String> {
    line.trim()
        .trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().trim_matches('`').to_string())
        .collect()
}

fn is_separator_row(line: &str) -> bool {
    line.trim()
        .trim_matches('|')
        .split('|')
        .all(|cell| !cell.trim().is_empty() && cell.trim().chars().all(|c| c == '-' || c == ':' || c == ' '))
}

/// List-item helper: lines beginning with `- ` or `* `, marker stripped.
pub fn parse_list_items(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter_map(|line| {
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .map(|s| s.trim().to_string())
        })
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_front_matter_and_sections() {
        let content = "---\nkind: entity\nid: KDDDocument\n---\n# Description\nBody text.\n\n## Attributes\n- a\n- b\n";
        let doc = parse(content);
        assert_eq!(doc.front_matter.get("kind").unwrap(), "entity");
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].heading, "Description");
        assert_eq!(doc.sections[0].path, "description");
        assert_eq!(doc.sections[1].path, "description.attributes");
    }

    #[test]
    fn malformed_front_matter_falls_back_to_whole_body() {
        let content = "---\nkind: [unterminated\nNo closing delimiter here\n# Heading\nbody\n";
        let doc = parse(content);
        assert!(doc.front_matter.is_empty());
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn absent_front_matter_is_empty() {
        let content = "# Just a heading\nsome text";
        let doc = parse(content);
        assert!(doc.front_matter.is_empty());
        assert_eq!(doc.sections[0].body, "some text");
    }

    #[test]
    fn anchor_slug_normalizes_diacritics_and_punctuation() {
        assert_eq!(anchor_slug("Descripci\u{f3}n"), "descripcion");
        assert_eq!(anchor_slug("Main Flow!"), "main-flow");
        assert_eq!(anchor_slug("  --trim me--  "), "trim-me");
    }

    #[test]
    fn sibling_headings_reset_path() {
        let content = "# A\n## B\ntext\n# C\n## D\ntext\n";
        let doc = parse(content);
        let paths: Vec<_> = doc.sections.iter().map(|s| s.path.clone()).collect();
        assert_eq!(paths, vec!["a", "a.b", "c", "c.d"]);
    }

    #[test]
    fn parses_table_rows() {
        let body = "| Name | Cardinality |\n|---|---|\n| `Order` | many |\n| Customer | one |\n";
        let rows = parse_table_rows(body);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], ("Name".to_string(), "Order".to_string()));
    }

    #[test]
    fn parses_list_items() {
        let body = "- one\n* two\nnot a list item\n- three";
        assert_eq!(parse_list_items(body), vec!["one", "two", "three"]);
    }
}
