//! Paragraph rewriting: token substitution and run re-segmentation.

use super::PlaceholderMap;
use crate::model::{Paragraph, TextRun};
use std::collections::BTreeMap;

/// Outcome of substituting tokens in one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Substitution<'m> {
    /// Text after substitution
    pub text: String,

    /// Number of replacements made per token
    pub hits: BTreeMap<&'m str, usize>,
}

impl Substitution<'_> {
    /// Total number of replacements.
    pub fn count(&self) -> usize {
        self.hits.values().sum()
    }
}

/// Replace every mapped token in `text` in a single pass.
///
/// Matches are taken left to right over the original text; when two tokens
/// start at the same position the longer one wins. Inserted values are never
/// scanned again, so a value containing a token stays literal.
///
/// Returns `None` when no token occurs in `text`.
pub(crate) fn substitute<'m>(text: &str, placeholders: &'m PlaceholderMap) -> Option<Substitution<'m>> {
    let mut found: Vec<(usize, &'m str, &'m str)> = Vec::new();
    for (token, value) in placeholders.iter() {
        found.extend(text.match_indices(token).map(|(pos, _)| (pos, token, value)));
    }
    if found.is_empty() {
        return None;
    }
    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.len().cmp(&a.1.len())));

    let mut out = String::with_capacity(text.len());
    let mut hits = BTreeMap::new();
    let mut cursor = 0;
    for (pos, token, value) in found {
        // Overlaps a match already consumed
        if pos < cursor {
            continue;
        }
        out.push_str(&text[cursor..pos]);
        out.push_str(value);
        cursor = pos + token.len();
        *hits.entry(token).or_insert(0) += 1;
    }
    out.push_str(&text[cursor..]);

    Some(Substitution { text: out, hits })
}

/// Distribute `new_text` over the paragraph's existing runs.
///
/// Each run receives as many characters as it held before, in order, and
/// keeps its own formatting. Runs past the end of `new_text` are left empty
/// but stay in place. Text left over after the last run is appended as one
/// extra run with the last run's formatting.
pub fn resegment(paragraph: &mut Paragraph, new_text: &str) {
    let mut rest = new_text;
    for run in paragraph.runs.iter_mut() {
        let len = run.char_len();
        let split = rest
            .char_indices()
            .nth(len)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(split);
        run.text = head.to_string();
        rest = tail;
    }

    if rest.is_empty() {
        return;
    }
    let extra = match paragraph.runs.last() {
        Some(last) => TextRun::styled(rest, last.style.clone()),
        None => TextRun::new(rest),
    };
    paragraph.runs.push(extra);
}

/// Rewrite one paragraph, returning the substitution details if it changed.
pub(crate) fn rewrite_paragraph<'m>(
    paragraph: &mut Paragraph,
    placeholders: &'m PlaceholderMap,
) -> Option<Substitution<'m>> {
    if paragraph.runs.is_empty() {
        return None;
    }
    let full_text = paragraph.plain_text();
    if full_text.is_empty() {
        return None;
    }

    let substitution = substitute(&full_text, placeholders)?;
    resegment(paragraph, &substitution.text);
    Some(substitution)
}

/// Replace placeholder tokens in a single paragraph, keeping run formatting.
///
/// Paragraphs without runs, without text, or without any mapped token are
/// left untouched and `None` is returned. Otherwise the number of
/// substitutions is returned.
///
/// # Example
///
/// ```
/// use docfill::fill::{replace_in_paragraph, PlaceholderMap};
/// use docfill::model::{Paragraph, TextRun};
///
/// let mut para = Paragraph::with_runs(vec![
///     TextRun::bold("Dear <<Name>>"),
///     TextRun::new(", welcome!"),
/// ]);
/// let map: PlaceholderMap = [("<<Name>>", "Ada")].into_iter().collect();
///
/// assert_eq!(replace_in_paragraph(&mut para, &map), Some(1));
/// assert_eq!(para.plain_text(), "Dear Ada, welcome!");
/// ```
pub fn replace_in_paragraph(paragraph: &mut Paragraph, placeholders: &PlaceholderMap) -> Option<usize> {
    rewrite_paragraph(paragraph, placeholders).map(|s| s.count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextStyle;

    fn map(pairs: &[(&str, &str)]) -> PlaceholderMap {
        pairs.iter().copied().collect()
    }

    fn run_texts(p: &Paragraph) -> Vec<&str> {
        p.runs.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_substitute_none_when_absent() {
        let m = map(&[("<<Name>>", "Bob")]);
        assert!(substitute("Hello there", &m).is_none());
    }

    #[test]
    fn test_substitute_all_occurrences() {
        let m = map(&[("<<Name>>", "Bob")]);
        let s = substitute("<<Name>> and <<Name>>", &m).unwrap();
        assert_eq!(s.text, "Bob and Bob");
        assert_eq!(s.hits.get("<<Name>>"), Some(&2));
        assert_eq!(s.count(), 2);
    }

    #[test]
    fn test_substitute_is_single_pass() {
        let m = map(&[("<<A>>", "<<B>>"), ("<<B>>", "b")]);
        let s = substitute("<<A>> <<B>>", &m).unwrap();
        assert_eq!(s.text, "<<B>> b");
    }

    #[test]
    fn test_substitute_prefers_longer_token_at_same_position() {
        let m = map(&[("<<S", "x"), ("<<S-Date>>", "01-03-2025")]);
        let s = substitute("<<S-Date>>", &m).unwrap();
        assert_eq!(s.text, "01-03-2025");
    }

    #[test]
    fn test_resegment_same_length() {
        let mut p = Paragraph::with_runs(vec![TextRun::new("ab"), TextRun::bold("cd")]);
        resegment(&mut p, "wxyz");
        assert_eq!(run_texts(&p), vec!["wx", "yz"]);
        assert!(p.runs[1].style.bold);
    }

    #[test]
    fn test_resegment_shorter_leaves_empty_runs() {
        let mut p = Paragraph::with_runs(vec![
            TextRun::new("abc"),
            TextRun::bold("def"),
            TextRun::italic("ghi"),
        ]);
        resegment(&mut p, "1234");
        assert_eq!(run_texts(&p), vec!["123", "4", ""]);
        assert_eq!(p.run_count(), 3);
        assert!(p.runs[2].style.italic);
    }

    #[test]
    fn test_resegment_longer_appends_run_with_last_style() {
        let style = TextStyle::default().with_font("Arial").with_size(12.0);
        let mut p = Paragraph::with_runs(vec![
            TextRun::bold("ab"),
            TextRun::styled("cd", style.clone()),
        ]);
        resegment(&mut p, "abcdEXTRA");
        assert_eq!(run_texts(&p), vec!["ab", "cd", "EXTRA"]);
        assert_eq!(p.runs[2].style, style);
    }

    #[test]
    fn test_resegment_multibyte_characters() {
        let mut p = Paragraph::with_runs(vec![TextRun::new("ééé"), TextRun::new("x")]);
        resegment(&mut p, "ñññ€");
        assert_eq!(run_texts(&p), vec!["ñññ", "€"]);
    }

    #[test]
    fn test_resegment_keeps_empty_original_runs_empty() {
        let mut p = Paragraph::with_runs(vec![
            TextRun::new("ab"),
            TextRun::new(""),
            TextRun::new("c"),
        ]);
        resegment(&mut p, "xyz");
        assert_eq!(run_texts(&p), vec!["xy", "", "z"]);
    }

    #[test]
    fn test_replace_token_spanning_runs() {
        let mut p = Paragraph::with_runs(vec![
            TextRun::new("Dear <<Cli"),
            TextRun::bold("ent Name>>,"),
        ]);
        let m = map(&[("<<Client Name>>", "Acme Ltd")]);
        assert_eq!(replace_in_paragraph(&mut p, &m), Some(1));
        assert_eq!(p.plain_text(), "Dear Acme Ltd,");
        assert_eq!(run_texts(&p), vec!["Dear Acme ", "Ltd,"]);
    }

    #[test]
    fn test_replace_skips_paragraph_without_tokens() {
        let original = Paragraph::with_runs(vec![TextRun::bold("No"), TextRun::new(" tokens")]);
        let mut p = original.clone();
        assert_eq!(replace_in_paragraph(&mut p, &map(&[("<<X>>", "y")])), None);
        assert_eq!(p, original);
    }

    #[test]
    fn test_replace_skips_empty_paragraphs() {
        let m = map(&[("<<X>>", "y")]);

        let mut p = Paragraph::new();
        assert_eq!(replace_in_paragraph(&mut p, &m), None);
        assert_eq!(p.run_count(), 0);

        let mut p = Paragraph::with_runs(vec![TextRun::bold("")]);
        assert_eq!(replace_in_paragraph(&mut p, &m), None);
        assert_eq!(p.run_count(), 1);
    }
}
