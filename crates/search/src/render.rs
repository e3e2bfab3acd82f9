//! Text layouts for assembled context.
//!
//! Evidence chunks are labelled `[P{paper}-C{chunk}]` (both 1-based) so answers can cite
//! them back.

use crate::candidates::ScoredCandidate;
use paper_protocol::{DocumentKey, PaperRef};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

pub const EVIDENCE_HEADER: &str = "Retrieved Paper Evidence:";
pub const FULL_CONTEXT_HEADER: &str = "Full Paper Contexts:";
pub const METADATA_ONLY_HEADER: &str = "Paper Metadata (no extractable text available):";

#[must_use]
pub fn evidence_label(paper_index: usize, chunk_index: usize) -> String {
    format!("[P{}-C{}]", paper_index + 1, chunk_index + 1)
}

fn write_paper_heading(out: &mut String, number: usize, paper: &PaperRef) {
    let _ = writeln!(out, "Paper {number}: {}", paper.display_title());
    if let Some(key) = paper.citation_key.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(out, "Citation key: {}", key.trim());
    }
    if let Some(creator) = paper.first_creator.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(out, "First author: {}", creator.trim());
    }
    if let Some(year) = paper.year.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(out, "Year: {}", year.trim());
    }
}

/// Render selected chunks grouped under their paper.
///
/// Output depends only on the *set* of `(key, chunk)` pairs: duplicates collapse, chunks are
/// listed in chunk order and papers in caller order. Papers with nothing selected are
/// omitted; with no candidates at all the result is empty.
#[must_use]
pub fn render_evidence_pack(papers: &[PaperRef], candidates: &[ScoredCandidate]) -> String {
    let mut positions: HashMap<DocumentKey, usize> = HashMap::new();
    for paper in papers {
        let next = positions.len();
        positions.entry(paper.key()).or_insert(next);
    }

    let mut grouped: BTreeMap<usize, BTreeMap<usize, &str>> = BTreeMap::new();
    for candidate in candidates {
        let Some(&pos) = positions.get(&candidate.key) else {
            continue;
        };
        grouped
            .entry(pos)
            .or_default()
            .entry(candidate.chunk_index)
            .or_insert(candidate.text.as_str());
    }
    if grouped.is_empty() {
        return String::new();
    }

    let mut unique: Vec<&PaperRef> = Vec::with_capacity(positions.len());
    for paper in papers {
        if positions.get(&paper.key()) == Some(&unique.len()) {
            unique.push(paper);
        }
    }

    let mut out = String::from(EVIDENCE_HEADER);
    out.push('\n');
    for (pos, chunks) in &grouped {
        out.push('\n');
        write_paper_heading(&mut out, pos + 1, unique[*pos]);
        for (chunk_index, text) in chunks {
            let _ = writeln!(out, "{} {}", evidence_label(*pos, *chunk_index), text.trim());
        }
    }
    out.trim_end().to_string()
}

/// Full text of every paper, each under its metadata heading.
#[must_use]
pub fn render_full_paper_contexts(papers: &[(&PaperRef, &str)]) -> String {
    let mut out = String::from(FULL_CONTEXT_HEADER);
    out.push('\n');
    for (i, (paper, text)) in papers.iter().enumerate() {
        out.push('\n');
        write_paper_heading(&mut out, i + 1, paper);
        let text = text.trim();
        if text.is_empty() {
            out.push_str("(No extractable text.)\n");
        } else {
            out.push_str("Full text:\n");
            out.push_str(text);
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

/// Metadata listing used when no evidence could be retrieved.
#[must_use]
pub fn render_metadata_only(papers: &[PaperRef]) -> String {
    let mut out = String::from(METADATA_ONLY_HEADER);
    out.push('\n');
    for (i, paper) in papers.iter().enumerate() {
        out.push('\n');
        write_paper_heading(&mut out, i + 1, paper);
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(key: DocumentKey, chunk_index: usize, text: &str) -> ScoredCandidate {
        ScoredCandidate {
            key,
            chunk_index,
            text: text.to_string(),
            estimated_tokens: 1,
            bm25_score: 0.0,
            embedding_score: 0.0,
            hybrid_score: 0.0,
        }
    }

    fn papers() -> Vec<PaperRef> {
        vec![
            PaperRef::new(1, 1, "Attention Is All You Need")
                .first_creator("Vaswani")
                .year("2017"),
            PaperRef::new(2, 2, "  "),
        ]
    }

    #[test]
    fn evidence_is_grouped_and_labelled() {
        let a = DocumentKey::new(1, 1);
        let b = DocumentKey::new(2, 2);
        let rendered = render_evidence_pack(
            &papers(),
            &[
                candidate(b, 0, "second paper chunk"),
                candidate(a, 4, "later chunk"),
                candidate(a, 1, "earlier chunk"),
            ],
        );

        assert_eq!(
            rendered,
            "Retrieved Paper Evidence:\n\
             \n\
             Paper 1: Attention Is All You Need\n\
             First author: Vaswani\n\
             Year: 2017\n\
             [P1-C2] earlier chunk\n\
             [P1-C5] later chunk\n\
             \n\
             Paper 2: Untitled\n\
             [P2-C1] second paper chunk"
        );
    }

    #[test]
    fn rendering_is_order_independent_and_deduplicated() {
        let a = DocumentKey::new(1, 1);
        let one = render_evidence_pack(
            &papers(),
            &[candidate(a, 0, "x"), candidate(a, 2, "y"), candidate(a, 0, "x")],
        );
        let two = render_evidence_pack(&papers(), &[candidate(a, 2, "y"), candidate(a, 0, "x")]);
        assert_eq!(one, two);
        assert_eq!(one.matches("[P1-C1]").count(), 1);
        assert!(!one.contains("Paper 2"));
    }

    #[test]
    fn no_candidates_renders_nothing() {
        assert_eq!(render_evidence_pack(&papers(), &[]), "");
        let stray = candidate(DocumentKey::new(7, 7), 0, "orphan");
        assert_eq!(render_evidence_pack(&papers(), &[stray]), "");
    }

    #[test]
    fn full_contexts_include_every_paper() {
        let papers = papers();
        let rendered = render_full_paper_contexts(&[(&papers[0], "Body text."), (&papers[1], "")]);
        assert!(rendered.starts_with("Full Paper Contexts:\n\nPaper 1: Attention Is All You Need"));
        assert!(rendered.contains("Full text:\nBody text."));
        assert!(rendered.ends_with("Paper 2: Untitled\n(No extractable text.)"));
    }

    #[test]
    fn metadata_only_lists_papers() {
        let rendered = render_metadata_only(&papers());
        assert!(rendered.starts_with(METADATA_ONLY_HEADER));
        assert!(rendered.contains("Paper 1: Attention Is All You Need"));
        assert!(rendered.contains("Paper 2: Untitled"));
    }
}
