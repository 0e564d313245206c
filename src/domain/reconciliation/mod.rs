//! Merge of ephemeral per-author content (stories) into the feed view.
//!
//! The merge is a full replace: the output depends only on the input items,
//! the viewing author and the clock.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Item that belongs to one author and disappears after a deadline.
pub trait EphemeralItem {
    fn item_id(&self) -> &str;
    fn author_id(&self) -> &str;
    fn timestamp(&self) -> DateTime<Utc>;
    fn expiry(&self) -> DateTime<Utc>;

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry() <= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEntry<T> {
    /// Always the first entry, even when the viewer has nothing live.
    SelfPlaceholder { author_id: String, latest: Option<T> },
    Author { item: T },
}

impl<T> FeedEntry<T> {
    pub fn item(&self) -> Option<&T> {
        match self {
            FeedEntry::SelfPlaceholder { latest, .. } => latest.as_ref(),
            FeedEntry::Author { item } => Some(item),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, FeedEntry::SelfPlaceholder { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<T> {
    pub entries: Vec<FeedEntry<T>>,
    /// Ids dropped because they had expired; the caller sweeps them from the
    /// local store.
    pub expired_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    pub fn merge<T>(items: Vec<T>, self_author: &str, now: DateTime<Utc>) -> MergeOutcome<T>
    where
        T: EphemeralItem,
    {
        let mut expired_ids = Vec::new();
        let mut own: Option<T> = None;
        let mut newest_by_author: HashMap<String, T> = HashMap::new();

        for item in items {
            if item.is_expired_at(now) {
                expired_ids.push(item.item_id().to_string());
                continue;
            }
            if item.author_id() == self_author {
                own = Some(match own {
                    Some(current) => newest(current, item),
                    None => item,
                });
                continue;
            }
            match newest_by_author.remove(item.author_id()) {
                Some(current) => {
                    let kept = newest(current, item);
                    newest_by_author.insert(kept.author_id().to_string(), kept);
                }
                None => {
                    newest_by_author.insert(item.author_id().to_string(), item);
                }
            }
        }

        let mut others: Vec<T> = newest_by_author.into_values().collect();
        others.sort_by(|a, b| {
            b.timestamp()
                .cmp(&a.timestamp())
                .then_with(|| a.author_id().cmp(b.author_id()))
        });

        let mut entries = Vec::with_capacity(others.len() + 1);
        entries.push(FeedEntry::SelfPlaceholder {
            author_id: self_author.to_string(),
            latest: own,
        });
        entries.extend(others.into_iter().map(|item| FeedEntry::Author { item }));

        expired_ids.sort();
        expired_ids.dedup();

        MergeOutcome {
            entries,
            expired_ids,
        }
    }
}

// Same-author tie on timestamp: later expiry wins, then the larger id, so the
// result does not depend on input order.
fn newest<T: EphemeralItem>(current: T, candidate: T) -> T {
    let ordering = candidate
        .timestamp()
        .cmp(&current.timestamp())
        .then_with(|| candidate.expiry().cmp(&current.expiry()))
        .then_with(|| candidate.item_id().cmp(current.item_id()));
    match ordering {
        Ordering::Greater => candidate,
        _ => current,
    }
}
