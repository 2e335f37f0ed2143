//! Paragraph-level chunker for embeddable sections.
//!
//! Mirrors the teacher's `semchunk`-flavoured chunk construction
//! (identity-prefixed context text, monotonic chunk ids) but implements the
//! greedy max-size/overlap packing described by the spec directly, since the
//! teacher's chunker is tuned for source code rather than prose sections.

use kdd_core::{Chunk, Kind, Layer, Section};

#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    pub max_chunk_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { max_chunk_chars: 1500, overlap_chars: 200 }
    }
}

pub struct DocumentContext<'a> {
    pub document_id: &'a str,
    pub kind: Kind,
    pub layer: Layer,
    pub title: Option<&'a str>,
}

/// Chunk every embeddable section of a document. Sections whose lowercased
/// heading is not in the kind's embeddable set, or whose body is blank, are
/// skipped entirely.
pub fn chunk_document(ctx: &DocumentContext, sections: &[Section], config: ChunkConfig) -> Vec<Chunk> {
    let embeddable = ctx.kind.embeddable_heading_names();
    let mut chunks = Vec::new();
    let mut index = 0usize;

    for section in sections {
        let heading_lower = section.heading.to_lowercase();
        if !embeddable.contains(&heading_lower.as_str()) {
            continue;
        }
        if section.body.trim().is_empty() {
            continue;
        }

        for (content, offset) in pack_section(&section.body, config) {
            let raw_content = content;
            let context_content = build_context(ctx, &section.heading, &raw_content);
            chunks.push(Chunk {
                id: format!("{}:chunk-{}", ctx.document_id, index),
                document_id: ctx.document_id.to_string(),
                heading: section.heading.clone(),
                raw_content,
                context_content,
                offset,
            });
            index += 1;
        }
    }

    chunks
}

fn build_context(ctx: &DocumentContext, heading: &str, content: &str) -> String {
    let mut preface = format!(
        "Document: {}\nKind: {}\nLayer: {}\n",
        ctx.document_id,
        ctx.kind.as_str(),
        ctx.layer.as_str()
    );
    if let Some(title) = ctx.title {
        preface.push_str(&format!("Title: {}\n", title));
    }
    preface.push_str(&format!("Section: {}\n\n", heading));
    preface.push_str(content);
    preface
}

fn pack_section(body: &str, config: ChunkConfig) -> Vec<(String, usize)> {
    let paragraphs = split_paragraphs(body);
    let mut chunks = Vec::new();
    let mut acc: Vec<(String, usize)> = Vec::new();
    let mut acc_chars = 0usize;

    let flush = |acc: &mut Vec<(String, usize)>, acc_chars: &mut usize, chunks: &mut Vec<(String, usize)>| {
        if acc.is_empty() {
            return;
        }
        let offset = acc[0].1;
        let content = acc.iter().map(|(p, _)| p.as_str()).collect::<Vec<_>>().join("\n\n");
        chunks.push((content, offset));
        acc.clear();
        *acc_chars = 0;
    };

    for (para, offset) in paragraphs {
        let para_len = para.chars().count();

        if para_len > config.max_chunk_chars {
            flush(&mut acc, &mut acc_chars, &mut chunks);
            for sentence_chunk in pack_sentences(&para, config.max_chunk_chars) {
                chunks.push((sentence_chunk, offset));
            }
            continue;
        }

        let additional = if acc.is_empty() { para_len } else { acc_chars + 2 + para_len };
        if additional > config.max_chunk_chars && !acc.is_empty() {
            let tail = acc.last().cloned().unwrap();
            flush(&mut acc, &mut acc_chars, &mut chunks);
            if tail.0.chars().count() <= config.overlap_chars {
                acc_chars = tail.0.chars().count();
                acc.push(tail);
            }
        }

        if acc.is_empty() {
            acc_chars = para_len;
        } else {
            acc_chars += 2 + para_len;
        }
        acc.push((para.to_string(), offset));
    }

    flush(&mut acc, &mut acc_chars, &mut chunks);
    chunks
}

/// Split on blank lines, trimming each paragraph and tracking the char
/// offset of its first non-whitespace character relative to `body`.
fn split_paragraphs(body: &str) -> Vec<(String, usize)> {
    let mut result = Vec::new();
    let mut offset = 0usize;

    for part in body.split("\n\n") {
        let leading_ws = part.chars().take_while(|c| c.is_whitespace()).count();
        let trimmed = part.trim();
        if !trimmed.is_empty() {
            result.push((trimmed.to_string(), offset + leading_ws));
        }
        offset += part.chars().count() + 2;
    }

    result
}

/// Sentence-split on `(?<=\.)\s+` semantics: break right after a period that
/// is followed by whitespace, consuming that whitespace as the delimiter.
fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < n {
        if chars[i] == '.' {
            let mut j = i + 1;
            if j < n && chars[j].is_whitespace() {
                sentences.push(chars[start..=i].iter().collect::<String>());
                while j < n && chars[j].is_whitespace() {
                    j += 1;
                }
                start = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }

    if start < n {
        sentences.push(chars[start..].iter().collect());
    }
    sentences
}

fn pack_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    let mut chunks = Vec::new();
    let mut acc = String::new();

    for sentence in sentences {
        let sentence_len = sentence.chars().count();
        let additional = if acc.is_empty() { sentence_len } else { acc.chars().count() + 1 + sentence_len };
        if additional > max_chars && !acc.is_empty() {
            chunks.push(std::mem::take(&mut acc));
        }
        if acc.is_empty() {
            acc = sentence;
        } else {
            acc.push(' ');
            acc.push_str(&sentence);
        }
    }

    if !acc.is_empty() {
        chunks.push(acc);
    }
    if chunks.is_empty() {
        chunks.push(text.to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(heading: &str, body: &str) -> Section {
        Section { heading: heading.to_string(), level: 2, body: body.to_string(), path: heading.to_lowercase() }
    }

    fn ctx<'a>() -> DocumentContext<'a> {
        DocumentContext { document_id: "KDDDocument", kind: Kind::Entity, layer: Layer::Domain, title: Some("KDD Document") }
    }

    #[test]
    fn skips_non_embeddable_sections() {
        let sections = vec![section("Attributes", "id: string\nname: string")];
        let chunks = chunk_document(&ctx(), &sections, ChunkConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn skips_blank_embeddable_section() {
        let sections = vec![section("Description", "   \n\n  ")];
        let chunks = chunk_document(&ctx(), &sections, ChunkConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn body_exactly_max_chars_is_one_chunk() {
        let body = "a".repeat(1500);
        let sections = vec![section("Description", &body)];
        let chunks = chunk_document(&ctx(), &sections, ChunkConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "KDDDocument:chunk-0");
    }

    #[test]
    fn two_paragraphs_over_max_chars_split_into_two_chunks() {
        let first = "a".repeat(1400);
        let second = "b".repeat(200);
        let body = format!("{}\n\n{}", first, second);
        let sections = vec![section("Description", &body)];
        let chunks = chunk_document(&ctx(), &sections, ChunkConfig::default());
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn unsplittable_paragraph_falls_back_to_one_chunk() {
        let body = "a".repeat(2000); // no sentence boundary
        let sections = vec![section("Description", &body)];
        let chunks = chunk_document(&ctx(), &sections, ChunkConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].raw_content.len(), 2000);
    }

    #[test]
    fn long_paragraph_splits_on_sentence_boundaries() {
        let sentence = format!("{}. ", "word ".repeat(60));
        let body = sentence.repeat(6);
        let sections = vec![section("Description", &body)];
        let chunks = chunk_document(&ctx(), &sections, ChunkConfig::default());
        assert!(chunks.len() > 1);
    }

    #[test]
    fn context_content_has_identity_preface() {
        let sections = vec![section("Description", "hello world")];
        let chunks = chunk_document(&ctx(), &sections, ChunkConfig::default());
        assert!(chunks[0].context_content.starts_with("Document: KDDDocument\nKind: entity\nLayer: domain\nTitle: KDD Document\nSection: Description\n\n"));
    }

    #[test]
    fn chunk_ids_are_monotonic_within_document() {
        let first = "a".repeat(1400);
        let second = "b".repeat(1400);
        let body = format!("{}\n\n{}", first, second);
        let sections = vec![section("Description", &body)];
        let chunks = chunk_document(&ctx(), &sections, ChunkConfig::default());
        let ids: Vec<_> = chunks.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec!["KDDDocument:chunk-0", "KDDDocument:chunk-1"]);
    }
}
