//! NER tag alignment between character-offset model output and a
//! word-tokenized document.
//!
//! The tagger collaborator reports spans as character offsets into the
//! raw text. Token positions are computed once up front, and alignment is
//! a two-pointer walk over (token, span) pairs, so there is no running
//! cursor to drift out of sync.

use polymat_core::models::labels;
use polymat_core::{Error, NerLabelGroup, NerTag, Result, TagSpan};

/// A word token with its character offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Inclusive character offset of the first character.
    pub start: usize,
    /// Exclusive character offset past the last character.
    pub end: usize,
}

/// Characters split off as single-character tokens.
fn is_detached_punct(c: char) -> bool {
    matches!(c, '.' | ',' | ';' | ':' | '(' | ')' | '[' | ']' | '!' | '?')
}

/// Split text into word tokens with character offsets.
///
/// Whitespace separates tokens; sentence punctuation and brackets become
/// their own single-character tokens so downstream sentence scoping and
/// parenthetical matching can key on them.
pub fn word_tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_start = 0usize;

    let mut pos = 0usize;
    for c in text.chars() {
        if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(Token {
                    text: std::mem::take(&mut current),
                    start: current_start,
                    end: pos,
                });
            }
        } else if is_detached_punct(c) {
            if !current.is_empty() {
                tokens.push(Token {
                    text: std::mem::take(&mut current),
                    start: current_start,
                    end: pos,
                });
            }
            tokens.push(Token {
                text: c.to_string(),
                start: pos,
                end: pos + 1,
            });
        } else {
            if current.is_empty() {
                current_start = pos;
            }
            current.push(c);
        }
        pos += 1;
    }
    if !current.is_empty() {
        tokens.push(Token {
            text: current,
            start: current_start,
            end: pos,
        });
    }
    tokens
}

/// Align tagger spans onto word tokens, producing one [`NerTag`] per
/// token.
///
/// Spans must be non-overlapping and sorted ascending by start offset. A
/// token takes a span's label when its start offset falls within
/// `[span.start, span.end)`; tokens before, between, and after spans get
/// `'O'`. An empty span list labels every token `'O'`. A span starting
/// beyond the end of the text is malformed and raises, to be caught and
/// logged per-paragraph by the caller.
pub fn align(text: &str, spans: &[TagSpan]) -> Result<Vec<NerTag>> {
    let text_len = text.chars().count();
    for span in spans {
        if span.start > text_len {
            return Err(Error::Alignment(format!(
                "span start {} beyond text length {}",
                span.start, text_len
            )));
        }
    }

    let tokens = word_tokenize(text);
    let mut tags = Vec::with_capacity(tokens.len());
    let mut span_idx = 0usize;

    for token in &tokens {
        while span_idx < spans.len() && token.start >= spans[span_idx].end {
            span_idx += 1;
        }
        let label = match spans.get(span_idx) {
            Some(span) if token.start >= span.start && token.start < span.end => {
                span.entity_group.clone()
            }
            _ => labels::OUTSIDE.to_string(),
        };
        tags.push(NerTag {
            text: token.text.clone(),
            label,
        });
    }
    Ok(tags)
}

/// Merge adjacent same-label tags into maximal groups.
///
/// Group text joins tokens with a single space, except tokens of length
/// ≤ 1 (punctuation) concatenate directly. Label equality is the only
/// merge criterion; `'O'` groups merge like any other. `start`/`end` are
/// token indices into the input sequence.
pub fn group_consecutive_tags(tags: &[NerTag]) -> Vec<NerLabelGroup> {
    let mut groups: Vec<NerLabelGroup> = Vec::new();

    for (idx, tag) in tags.iter().enumerate() {
        match groups.last_mut() {
            Some(group) if group.label == tag.label => {
                if tag.text.chars().count() <= 1 {
                    group.text.push_str(&tag.text);
                } else {
                    group.text.push(' ');
                    group.text.push_str(&tag.text);
                }
                group.end = idx;
            }
            _ => {
                groups.push(NerLabelGroup {
                    text: tag.text.clone(),
                    label: tag.label.clone(),
                    start: idx,
                    end: idx,
                });
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize, label: &str) -> TagSpan {
        TagSpan {
            start,
            end,
            entity_group: label.to_string(),
            word: String::new(),
        }
    }

    #[test]
    fn test_word_tokenize_offsets() {
        let tokens = word_tokenize("PE has a Tg.");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["PE", "has", "a", "Tg", "."]);
        assert_eq!(tokens[0].start, 0);
        assert_eq!(tokens[0].end, 2);
        assert_eq!(tokens[3].start, 9);
        assert_eq!(tokens[3].end, 11);
        assert_eq!(tokens[4].start, 11);
    }

    #[test]
    fn test_word_tokenize_detaches_parentheses() {
        let tokens = word_tokenize("polyethylene (PE) film");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["polyethylene", "(", "PE", ")", "film"]);
    }

    #[test]
    fn test_word_tokenize_empty() {
        assert!(word_tokenize("").is_empty());
        assert!(word_tokenize("   ").is_empty());
    }

    #[test]
    fn test_align_no_predictions_all_outside() {
        let text = "The glass transition was measured.";
        let tags = align(text, &[]).unwrap();
        assert_eq!(tags.len(), word_tokenize(text).len());
        assert!(tags.iter().all(|t| t.label == "O"));
    }

    #[test]
    fn test_align_one_tag_per_token() {
        let text = "PS exhibits a Tg of 100 °C in air";
        //          0123456789...
        let spans = vec![span(0, 2, "POLYMER"), span(14, 16, "PROP_NAME")];
        let tags = align(text, &spans).unwrap();
        assert_eq!(tags.len(), word_tokenize(text).len());
        assert_eq!(tags[0].label, "POLYMER");
        assert_eq!(tags[0].text, "PS");
        let tg = tags.iter().find(|t| t.text == "Tg").unwrap();
        assert_eq!(tg.label, "PROP_NAME");
    }

    #[test]
    fn test_align_labels_from_span_list_only() {
        let text = "polystyrene melts above 240 °C";
        let spans = vec![span(0, 11, "POLYMER"), span(24, 30, "PROP_VALUE")];
        let tags = align(text, &spans).unwrap();
        for tag in &tags {
            assert!(
                tag.label == "O" || tag.label == "POLYMER" || tag.label == "PROP_VALUE",
                "unexpected label {}",
                tag.label
            );
        }
    }

    #[test]
    fn test_align_tokens_between_spans_are_outside() {
        let text = "PMMA and PS";
        let spans = vec![span(0, 4, "POLYMER"), span(9, 11, "POLYMER")];
        let tags = align(text, &spans).unwrap();
        assert_eq!(tags[0].label, "POLYMER");
        assert_eq!(tags[1].label, "O");
        assert_eq!(tags[2].label, "POLYMER");
    }

    #[test]
    fn test_align_multiword_span_covers_every_token() {
        let text = "the glass transition temperature of PS";
        let spans = vec![span(4, 32, "PROP_NAME")];
        let tags = align(text, &spans).unwrap();
        assert_eq!(tags[1].label, "PROP_NAME");
        assert_eq!(tags[2].label, "PROP_NAME");
        assert_eq!(tags[3].label, "PROP_NAME");
        assert_eq!(tags[0].label, "O");
        assert_eq!(tags[4].label, "O");
    }

    #[test]
    fn test_align_malformed_span_raises() {
        let text = "short";
        let spans = vec![span(100, 110, "POLYMER")];
        let err = align(text, &spans).unwrap_err();
        assert!(matches!(err, Error::Alignment(_)));
    }

    #[test]
    fn test_group_merges_consecutive_labels() {
        let tags = vec![
            NerTag { text: "glass".into(), label: "PROP_NAME".into() },
            NerTag { text: "transition".into(), label: "PROP_NAME".into() },
            NerTag { text: "of".into(), label: "O".into() },
            NerTag { text: "PS".into(), label: "POLYMER".into() },
        ];
        let groups = group_consecutive_tags(&tags);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].text, "glass transition");
        assert_eq!(groups[0].label, "PROP_NAME");
        assert_eq!(groups[0].start, 0);
        assert_eq!(groups[0].end, 1);
        assert_eq!(groups[2].text, "PS");
        assert_eq!(groups[2].start, 3);
    }

    #[test]
    fn test_group_no_adjacent_equal_labels() {
        let tags = vec![
            NerTag { text: "a".into(), label: "O".into() },
            NerTag { text: "b".into(), label: "O".into() },
            NerTag { text: "c".into(), label: "X".into() },
            NerTag { text: "d".into(), label: "X".into() },
            NerTag { text: "e".into(), label: "O".into() },
        ];
        let groups = group_consecutive_tags(&tags);
        for pair in groups.windows(2) {
            assert_ne!(pair[0].label, pair[1].label);
        }
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_group_punctuation_concatenates_directly() {
        let tags = vec![
            NerTag { text: "measured".into(), label: "O".into() },
            NerTag { text: "at".into(), label: "O".into() },
            NerTag { text: ".".into(), label: "O".into() },
        ];
        let groups = group_consecutive_tags(&tags);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].text, "measured at.");
    }

    #[test]
    fn test_group_outside_merges_like_any_label() {
        let tags = vec![
            NerTag { text: "x".into(), label: "O".into() },
            NerTag { text: "yy".into(), label: "O".into() },
        ];
        let groups = group_consecutive_tags(&tags);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "O");
    }

    #[test]
    fn test_group_reconstructs_token_sequence() {
        let text = "PS exhibits a Tg of 100 °C";
        let tags = align(text, &[span(0, 2, "POLYMER")]).unwrap();
        let groups = group_consecutive_tags(&tags);
        let rebuilt: Vec<String> = groups
            .iter()
            .flat_map(|g| g.text.split_whitespace().map(String::from))
            .collect();
        let original: Vec<String> = word_tokenize(text).into_iter().map(|t| t.text).collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_group_empty_input() {
        assert!(group_consecutive_tags(&[]).is_empty());
    }
}
