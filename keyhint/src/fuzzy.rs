//! Fuzzy ranking of command titles against a typed query.
//!
//! One greedy left-to-right alignment per title, no edit distance. Text is
//! compared per grapheme cluster after Unicode normalization and case
//! folding, so composed and decomposed accents compare equal and no
//! multi-codepoint cluster is ever split.

use crate::types::CommandItem;
use std::ops::Range;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

const MATCH_SCORE: i32 = 10;
const PREFIX_BONUS: i32 = 15;
const BOUNDARY_BONUS: i32 = 8;
/// Bonus per extra character of an unbroken run: the n-th character of a run
/// earns `(n - 1) * CONSECUTIVE_STEP`.
const CONSECUTIVE_STEP: i32 = 5;
/// Per unmatched title grapheme between two matches.
const GAP_PENALTY: i32 = 1;

/// Ranked search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Index of the item in the searched slice.
    pub index: usize,
    /// `None` for the empty query, which returns everything unscored.
    pub score: Option<i32>,
    /// Byte ranges of matched text in the item's title, merged and ordered.
    pub ranges: Vec<Range<usize>>,
}

/// Score and highlight ranges of one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    pub score: i32,
    pub ranges: Vec<Range<usize>>,
}

struct Unit {
    bytes: Range<usize>,
    folded: String,
    first: char,
}

/// Lowercases one grapheme in canonical composition. This is simple
/// lowercasing, not full case folding: expanding folds such as `ß` to `ss`
/// are not applied, so a grapheme only matches a grapheme.
fn fold(grapheme: &str) -> String {
    let lowered = grapheme.nfd().collect::<String>().to_lowercase();
    lowered.nfc().collect()
}

fn units(text: &str) -> Vec<Unit> {
    text.grapheme_indices(true)
        .map(|(start, g)| Unit {
            bytes: start..start + g.len(),
            folded: fold(g),
            first: g.chars().next().unwrap_or(' '),
        })
        .collect()
}

fn is_boundary(previous: char, current: char) -> bool {
    !previous.is_alphanumeric()
        || (previous.is_uppercase() && current.is_lowercase())
        || (previous.is_lowercase() && current.is_uppercase())
}

/// A query folded once and reused across titles.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    graphemes: Vec<String>,
}

impl PreparedQuery {
    pub fn new(query: &str) -> Self {
        Self {
            graphemes: query.trim().graphemes(true).map(fold).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.graphemes.is_empty()
    }

    /// Aligns the query against `title`. `None` when some query grapheme has
    /// no in-order counterpart.
    pub fn score(&self, title: &str) -> Option<TitleMatch> {
        if self.graphemes.is_empty() {
            return Some(TitleMatch {
                score: 0,
                ranges: Vec::new(),
            });
        }
        let title_units = units(title);
        let mut cursor = 0;
        let mut score = 0;
        let mut run = 0;
        let mut last_matched: Option<usize> = None;
        let mut ranges: Vec<Range<usize>> = Vec::new();

        for needle in &self.graphemes {
            let offset = title_units[cursor..]
                .iter()
                .position(|unit| unit.folded == *needle)?;
            let at = cursor + offset;
            let unit = &title_units[at];

            score += MATCH_SCORE;
            if at == 0 {
                score += PREFIX_BONUS;
            } else if is_boundary(title_units[at - 1].first, unit.first) {
                score += BOUNDARY_BONUS;
            }

            match last_matched {
                Some(previous) if previous + 1 == at => {
                    run += 1;
                    score += CONSECUTIVE_STEP * run;
                }
                Some(previous) => {
                    run = 0;
                    score -= GAP_PENALTY * (at - previous - 1) as i32;
                }
                None => run = 0,
            }

            match ranges.last_mut() {
                Some(range) if range.end == unit.bytes.start => range.end = unit.bytes.end,
                _ => ranges.push(unit.bytes.clone()),
            }
            last_matched = Some(at);
            cursor = at + 1;
        }

        Some(TitleMatch { score, ranges })
    }
}

/// Scores `query` against one title.
pub fn score_title(query: &str, title: &str) -> Option<TitleMatch> {
    PreparedQuery::new(query).score(title)
}

/// Ranks `items` by descending score against their titles.
///
/// Items that do not align are dropped. The empty query returns every item,
/// unscored, in the original order. Order among equal scores is unspecified.
pub fn search<H>(query: &str, items: &[CommandItem<H>]) -> Vec<Match> {
    search_titles(query, items.iter().map(|item| item.title.as_str()))
}

/// [`search`] over bare titles.
pub fn search_titles<'a>(query: &str, titles: impl IntoIterator<Item = &'a str>) -> Vec<Match> {
    let prepared = PreparedQuery::new(query);
    if prepared.is_empty() {
        return titles
            .into_iter()
            .enumerate()
            .map(|(index, _)| Match {
                index,
                score: None,
                ranges: Vec::new(),
            })
            .collect();
    }

    let mut matches: Vec<Match> = titles
        .into_iter()
        .enumerate()
        .filter_map(|(index, title)| {
            prepared.score(title).map(|m| Match {
                index,
                score: Some(m.score),
                ranges: m.ranges,
            })
        })
        .collect();
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked<'a>(query: &str, titles: &[&'a str]) -> Vec<&'a str> {
        search_titles(query, titles.iter().copied())
            .into_iter()
            .map(|m| titles[m.index])
            .collect()
    }

    #[test]
    fn empty_query_returns_everything_unscored() {
        let titles = ["Zoom", "Copy", "Paste"];
        let results = search_titles("", titles.iter().copied());
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|m| m.score.is_none()));
        assert_eq!(
            results.iter().map(|m| m.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn unalignable_query_is_dropped() {
        assert!(ranked("xyz", &["Copy", "Paste"]).is_empty());
        // Characters present but out of order.
        assert!(ranked("ypc", &["Copy"]).is_empty());
        assert_eq!(score_title("ypc", "Copy"), None);
    }

    #[test]
    fn prefix_bonus_wins() {
        assert_eq!(ranked("pas", &["Copy and Paste", "Paste"]), vec!["Paste", "Copy and Paste"]);
        assert_eq!(ranked("pas", &["Paste", "Copy and Paste"])[0], "Paste");
    }

    #[test]
    fn consecutive_run_wins() {
        assert_eq!(ranked("cop", &["CoOpYard", "Copy"])[0], "Copy");
        assert_eq!(ranked("cop", &["Copy", "CoOpYard"])[0], "Copy");
    }

    #[test]
    fn ranges_cover_matched_characters() {
        let title = "Find and Replace";
        let m = score_title("far", title).unwrap();
        let highlighted: Vec<&str> = m.ranges.iter().map(|r| &title[r.clone()]).collect();
        assert_eq!(highlighted, vec!["F", "a", "R"]);
    }

    #[test]
    fn consecutive_ranges_merge() {
        let m = score_title("pas", "Paste").unwrap();
        assert_eq!(m.ranges, vec![0..3]);
    }

    #[test]
    fn composed_and_decomposed_accents_match() {
        let composed = "Caf\u{e9}";
        let decomposed = "Cafe\u{301}";
        assert!(score_title(composed, decomposed).is_some());
        assert!(score_title(decomposed, composed).is_some());
        let m = score_title("\u{e9}", decomposed).unwrap();
        assert_eq!(&decomposed[m.ranges[0].clone()], "e\u{301}");
    }

    #[test]
    fn matching_ignores_case() {
        assert!(score_title("ÉCOLE", "école").is_some());
        assert!(score_title("STRASSE", "straße").is_none());
        assert!(score_title("STRAẞE", "straße").is_some());
    }

    #[test]
    fn non_latin_graphemes_stay_whole() {
        let title = "設定を開く";
        let m = score_title("開", title).unwrap();
        assert_eq!(&title[m.ranges[0].clone()], "開");

        let hindi = "नमस्ते";
        assert!(score_title("स्ते", hindi).is_some());
    }

    #[test]
    fn word_boundary_beats_mid_word() {
        let boundary = score_title("r", "Find Replace").unwrap().score;
        let middle = score_title("r", "Fir").unwrap().score;
        assert!(boundary > middle);
    }
}
