//! Two-letter hint labels.
//!
//! Label `n` is `n` written in base 25 with both digits drawn from
//! [`ALPHABET`], which leaves out `O`.

use tracing::warn;

/// Label symbols in order. `O` is excluded: it reads like `Q` and `0`.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNPQRSTUVWXYZ";

/// Letter never used in labels.
pub const EXCLUDED_LETTER: char = 'O';

/// Number of distinct two-letter labels.
pub const CAPACITY: usize = ALPHABET.len() * ALPHABET.len();

/// Label for a single index, for streaming discovery. `None` past capacity.
pub fn label_at(index: usize) -> Option<String> {
    if index >= CAPACITY {
        return None;
    }
    let base = ALPHABET.len();
    let high = ALPHABET[index / base] as char;
    let low = ALPHABET[index % base] as char;
    Some([high, low].iter().collect())
}

/// Labels for `count` targets, in order. Truncated at [`CAPACITY`].
pub fn labels_for(count: usize) -> Vec<String> {
    if count > CAPACITY {
        warn!(
            requested = count,
            capacity = CAPACITY,
            "More targets than labels; extra targets stay unlabeled"
        );
    }
    (0..count.min(CAPACITY)).filter_map(label_at).collect()
}

/// Labels starting with `typed`, case-insensitively, as indices into `labels`.
pub fn filter_by_prefix(labels: &[String], typed: &str) -> Vec<usize> {
    let typed = typed.trim().to_ascii_uppercase();
    labels
        .iter()
        .enumerate()
        .filter(|(_, label)| label.to_ascii_uppercase().starts_with(&typed))
        .map(|(i, _)| i)
        .collect()
}

/// The single label still matching `typed`; `None` for zero or several.
pub fn resolve_unique(labels: &[String], typed: &str) -> Option<usize> {
    match filter_by_prefix(labels, typed).as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Index of the label equal to `typed`, ignoring case.
pub fn resolve_exact(labels: &[String], typed: &str) -> Option<usize> {
    let typed = typed.trim();
    labels.iter().position(|label| label.eq_ignore_ascii_case(typed))
}

/// Labels bound to one discovery session's target list.
#[derive(Debug, Clone, Default)]
pub struct HintLabels {
    labels: Vec<String>,
}

impl HintLabels {
    pub fn for_count(count: usize) -> Self {
        Self {
            labels: labels_for(count),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Appends the next label, for targets arriving one at a time.
    pub fn push_next(&mut self) -> Option<&str> {
        let label = label_at(self.labels.len())?;
        self.labels.push(label);
        self.labels.last().map(String::as_str)
    }

    pub fn filter(&self, typed: &str) -> Vec<usize> {
        filter_by_prefix(&self.labels, typed)
    }

    pub fn resolve_unique(&self, typed: &str) -> Option<usize> {
        resolve_unique(&self.labels, typed)
    }

    pub fn resolve_exact(&self, typed: &str) -> Option<usize> {
        resolve_exact(&self.labels, typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(label: &str) -> usize {
        let bytes = label.as_bytes();
        let pos = |b: u8| ALPHABET.iter().position(|a| *a == b).unwrap();
        pos(bytes[0]) * ALPHABET.len() + pos(bytes[1])
    }

    #[test]
    fn alphabet_excludes_confusable_letter() {
        assert_eq!(ALPHABET.len(), 25);
        assert!(!ALPHABET.contains(&(EXCLUDED_LETTER as u8)));
    }

    #[test]
    fn counts_are_capped_at_capacity() {
        // Two letters from a 25-symbol alphabet give 625 labels; larger
        // counts are truncated there.
        for n in 0..=1300 {
            let labels = labels_for(n);
            assert_eq!(labels.len(), n.min(CAPACITY), "count {n}");
            for label in &labels {
                assert_eq!(label.chars().count(), 2);
                assert!(!label.contains(EXCLUDED_LETTER));
            }
            for pair in labels.windows(2) {
                assert!(rank(&pair[0]) < rank(&pair[1]));
            }
        }
    }

    #[test]
    fn first_and_last_labels() {
        assert_eq!(label_at(0).as_deref(), Some("AA"));
        assert_eq!(label_at(1).as_deref(), Some("AB"));
        assert_eq!(label_at(25).as_deref(), Some("BA"));
        assert_eq!(label_at(CAPACITY - 1).as_deref(), Some("ZZ"));
        assert_eq!(label_at(CAPACITY), None);
    }

    #[test]
    fn single_target_still_gets_two_letters() {
        assert_eq!(labels_for(1), vec!["AA".to_string()]);
    }

    #[test]
    fn prefix_filter_is_case_insensitive() {
        let labels = labels_for(60);
        let hits = filter_by_prefix(&labels, "b");
        assert_eq!(hits.len(), 25);
        assert_eq!(filter_by_prefix(&labels, "").len(), 60);
        assert!(filter_by_prefix(&labels, "o").is_empty());
    }

    #[test]
    fn resolve_unique_needs_exactly_one_match() {
        let labels = labels_for(30);
        assert_eq!(resolve_unique(&labels, "a"), None);
        assert_eq!(resolve_unique(&labels, "ZZ"), None);
        assert_eq!(resolve_unique(&labels, "ab"), Some(1));
        // Only "BA".."BE" exist past the first 25; "BC" is unique.
        assert_eq!(resolve_unique(&labels, "bc"), Some(27));

        let one = labels_for(1);
        assert_eq!(resolve_unique(&one, "A"), Some(0));
    }

    #[test]
    fn resolve_exact_match() {
        let labels = labels_for(30);
        assert_eq!(resolve_exact(&labels, "ba"), Some(25));
        assert_eq!(resolve_exact(&labels, "B"), None);
    }

    #[test]
    fn streaming_labels_match_batch_labels() {
        let mut streaming = HintLabels::default();
        for _ in 0..40 {
            streaming.push_next();
        }
        assert_eq!(streaming.labels(), HintLabels::for_count(40).labels());
    }
}
