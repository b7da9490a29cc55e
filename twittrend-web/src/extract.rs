//! Locating the current-trends list inside an uncontrolled page.
//!
//! The production path is the longest-list heuristic: every `ul`/`ol` is a
//! candidate, the one with the most direct `li` children wins (first in
//! document order on ties), and it must reach `min_items` to be trusted.
//! Navigation and footer lists stay far below that threshold.
//!
//! The heading-landmark search (region heading, then "current" heading, then
//! the next list) is kept as an opt-in fallback. When enabled and the
//! heuristic succeeds, it only runs to log whether both strategies agree.

use crate::dom::{DocumentTree, HtmlTree};
use crate::trend::{RawDocument, TrendEntry, TrendList};
use twittrend_common::{ExtractionFailure, Result, TrendError};

pub const DEFAULT_MIN_ITEMS: usize = 20;
pub const DEFAULT_MAX_ITEMS: usize = 50;

const LIST_TAGS: &[&str] = &["ul", "ol"];
const ITEM_TAG: &str = "li";
const REGION_HEADINGS: &[&str] = &["h3", "h4"];
const CURRENT_HEADINGS: &[&str] = &["h2", "h3"];

/// Heading texts the landmark strategy anchors on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landmarks {
    pub region_marker: String,
    pub current_marker: String,
}

impl Default for Landmarks {
    fn default() -> Self {
        Self {
            region_marker: "日本のトレンド".into(),
            current_marker: "現在".into(),
        }
    }
}

/// Outcome of scanning every list element.
#[derive(Debug, Clone, Copy)]
pub struct ListSelection<N> {
    /// Longest list and its item count; `None` when the page has no lists.
    pub winner: Option<(N, usize)>,
    pub lists_scanned: usize,
}

/// Scan every list element and keep the one with the most direct items.
/// Ties keep the earlier list.
pub fn select_longest_list<T: DocumentTree>(tree: &T) -> ListSelection<T::Node<'_>> {
    let mut winner: Option<(T::Node<'_>, usize)> = None;
    let mut lists_scanned = 0;

    for list in tree.find_all(LIST_TAGS) {
        lists_scanned += 1;
        let count = tree.count_children(list, ITEM_TAG);
        if winner.is_none_or(|(_, best)| count > best) {
            winner = Some((list, count));
        }
    }

    ListSelection {
        winner,
        lists_scanned,
    }
}

#[derive(Debug, Clone)]
pub struct TrendExtractor {
    min_items: usize,
    max_items: usize,
    landmarks: Option<Landmarks>,
}

impl Default for TrendExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendExtractor {
    pub fn new() -> Self {
        Self {
            min_items: DEFAULT_MIN_ITEMS,
            max_items: DEFAULT_MAX_ITEMS,
            landmarks: None,
        }
    }

    pub fn with_limits(mut self, min_items: usize, max_items: usize) -> Self {
        self.min_items = min_items.max(1);
        self.max_items = max_items.max(1);
        self
    }

    pub fn with_landmark_fallback(mut self, landmarks: Landmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn min_items(&self) -> usize {
        self.min_items
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Parse `doc` with html5ever and extract from it.
    pub fn extract_document(&self, doc: &RawDocument) -> Result<TrendList> {
        let tree = HtmlTree::parse(doc.as_str());
        tracing::debug!(
            url = doc.url(),
            bytes = doc.len(),
            recovered_errors = tree.recovered_errors(),
            "extract.document.parsed"
        );
        self.extract(&tree)
    }

    pub fn extract<T: DocumentTree>(&self, tree: &T) -> Result<TrendList> {
        let majority = self.extract_longest(tree);

        let Some(landmarks) = &self.landmarks else {
            return majority;
        };

        match majority {
            Ok(trends) => {
                self.report_agreement(tree, landmarks, &trends);
                Ok(trends)
            }
            Err(err) => match self.extract_landmark(tree, landmarks) {
                Some(Ok(trends)) => {
                    tracing::warn!(
                        majority_error = %err,
                        entries = trends.len(),
                        "extract.landmark.fallback_used"
                    );
                    Ok(trends)
                }
                Some(Err(landmark_err)) => {
                    tracing::warn!(%landmark_err, "extract.landmark.fallback_failed");
                    Err(err)
                }
                None => {
                    tracing::warn!("extract.landmark.not_found");
                    Err(err)
                }
            },
        }
    }

    fn extract_longest<T: DocumentTree>(&self, tree: &T) -> Result<TrendList> {
        let selection = select_longest_list(tree);
        let best_count = selection.winner.map_or(0, |(_, count)| count);

        let list = match selection.winner {
            Some((list, count)) if count >= self.min_items => list,
            _ => {
                tracing::warn!(
                    best_count,
                    threshold = self.min_items,
                    lists_scanned = selection.lists_scanned,
                    "extract.majority.too_short"
                );
                return Err(TrendError::Extraction(ExtractionFailure::ListTooShort {
                    best_count,
                    threshold: self.min_items,
                    lists_scanned: selection.lists_scanned,
                }));
            }
        };

        tracing::info!(
            item_count = best_count,
            lists_scanned = selection.lists_scanned,
            "extract.majority.selected"
        );
        self.entries_from(tree, list)
    }

    /// `None` when the landmarks are not on the page.
    fn extract_landmark<T: DocumentTree>(
        &self,
        tree: &T,
        landmarks: &Landmarks,
    ) -> Option<Result<TrendList>> {
        let list = find_landmark_list(tree, landmarks)?;
        Some(self.entries_from(tree, list))
    }

    fn report_agreement<T: DocumentTree>(
        &self,
        tree: &T,
        landmarks: &Landmarks,
        trends: &TrendList,
    ) {
        match self.extract_landmark(tree, landmarks) {
            Some(Ok(other)) => {
                let agrees = other == *trends;
                if agrees {
                    tracing::debug!(entries = trends.len(), "extract.landmark.agrees");
                } else {
                    tracing::warn!(
                        majority_entries = trends.len(),
                        landmark_entries = other.len(),
                        majority_first = trends.entries()[0].as_str(),
                        landmark_first = other.entries()[0].as_str(),
                        "extract.landmark.disagrees"
                    );
                }
            }
            Some(Err(err)) => tracing::debug!(%err, "extract.landmark.unusable"),
            None => tracing::debug!("extract.landmark.not_found"),
        }
    }

    fn entries_from<'a, T: DocumentTree>(&self, tree: &'a T, list: T::Node<'a>) -> Result<TrendList> {
        let entries: Vec<TrendEntry> = tree
            .children_with_tag(list, ITEM_TAG)
            .into_iter()
            .take(self.max_items)
            .map(|li| TrendEntry::parse(&tree.text_content(li)))
            .collect();
        let candidates = entries.len();

        let empty = entries.iter().filter(|e| e.is_empty()).count();
        if empty == candidates {
            return Err(TrendError::Extraction(
                ExtractionFailure::NoUsableEntries { candidates },
            ));
        }
        if empty > 0 {
            tracing::warn!(empty, candidates, "extract.entries.empty_labels");
        }

        TrendList::new(entries).ok_or(TrendError::Extraction(
            ExtractionFailure::NoUsableEntries { candidates },
        ))
    }
}

/// Region heading (`h3`/`h4`), then the "current" heading after it
/// (`h2`/`h3`), then the first list after that.
pub fn find_landmark_list<'a, T: DocumentTree>(
    tree: &'a T,
    landmarks: &Landmarks,
) -> Option<T::Node<'a>> {
    let region = tree
        .find_all(REGION_HEADINGS)
        .into_iter()
        .find(|&h| tree.text_content(h).contains(landmarks.region_marker.as_str()))?;
    let current = tree.next_matching(region, CURRENT_HEADINGS, |text| {
        text.contains(landmarks.current_marker.as_str())
    })?;
    tree.next_matching(current, LIST_TAGS, |_| true)
}
