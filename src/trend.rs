//! Rank-movement classification of the current trending list against earlier
//! snapshots.

use crate::models::Repository;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendStatus {
    Rising,
    Falling,
    Stable,
}

/// A status only exists for items seen before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "TrendWire")]
pub enum Trend {
    New,
    Known {
        previous_rank: usize,
        status: TrendStatus,
    },
}

impl Trend {
    pub fn is_new(&self) -> bool {
        matches!(self, Trend::New)
    }

    pub fn status(&self) -> Option<TrendStatus> {
        match self {
            Trend::New => None,
            Trend::Known { status, .. } => Some(*status),
        }
    }

    fn compare(current_rank: usize, previous_rank: usize) -> Self {
        let status = match current_rank.cmp(&previous_rank) {
            std::cmp::Ordering::Less => TrendStatus::Rising,
            std::cmp::Ordering::Greater => TrendStatus::Falling,
            std::cmp::Ordering::Equal => TrendStatus::Stable,
        };
        Trend::Known {
            previous_rank,
            status,
        }
    }
}

#[derive(Serialize)]
struct TrendWire {
    is_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TrendStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_rank: Option<usize>,
}

impl From<Trend> for TrendWire {
    fn from(trend: Trend) -> Self {
        match trend {
            Trend::New => TrendWire {
                is_new: true,
                status: None,
                previous_rank: None,
            },
            Trend::Known {
                previous_rank,
                status,
            } => TrendWire {
                is_new: false,
                status: Some(status),
                previous_rank: Some(previous_rank),
            },
        }
    }
}

/// One historical report reduced to `full_name -> rank`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: i64,
    pub week_start: Option<String>,
    ranks: HashMap<String, usize>,
}

impl Snapshot {
    pub fn new(id: i64, week_start: Option<String>, repositories: &[Repository]) -> Self {
        let mut ranks = HashMap::with_capacity(repositories.len());
        for (index, repo) in repositories.iter().enumerate() {
            ranks.insert(repo.full_name.clone(), index + 1);
        }
        Self {
            id,
            week_start,
            ranks,
        }
    }

    pub fn rank_of(&self, full_name: &str) -> Option<usize> {
        self.ranks.get(full_name).copied()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRepository {
    pub rank: usize,
    #[serde(flatten)]
    pub repository: Repository,
    pub trend: Trend,
}

/// Classifies every current item against `history`, which must be ordered
/// most recent first. Only the first snapshot containing an item counts.
pub fn reconcile(current: &[Repository], history: &[Snapshot]) -> Vec<RankedRepository> {
    current
        .iter()
        .enumerate()
        .map(|(index, repo)| {
            let rank = index + 1;
            let trend = history
                .iter()
                .find_map(|snapshot| snapshot.rank_of(&repo.full_name))
                .map_or(Trend::New, |previous| Trend::compare(rank, previous));
            RankedRepository {
                rank,
                repository: repo.clone(),
                trend,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repos(names: &[&str]) -> Vec<Repository> {
        names
            .iter()
            .map(|name| Repository {
                full_name: name.to_string(),
                name: name.to_string(),
                ..Repository::default()
            })
            .collect()
    }

    fn snapshot(id: i64, names: &[&str]) -> Snapshot {
        Snapshot::new(id, None, &repos(names))
    }

    fn statuses(ranked: &[RankedRepository]) -> Vec<Option<TrendStatus>> {
        ranked.iter().map(|r| r.trend.status()).collect()
    }

    #[test]
    fn swapped_ranks_rise_fall_and_hold() {
        let current = repos(&["A", "B", "C"]);
        let history = vec![snapshot(1, &["B", "A", "C"])];

        let ranked = reconcile(&current, &history);
        assert_eq!(
            statuses(&ranked),
            vec![
                Some(TrendStatus::Rising),
                Some(TrendStatus::Falling),
                Some(TrendStatus::Stable)
            ]
        );
        assert_eq!(ranked[0].trend, Trend::Known { previous_rank: 2, status: TrendStatus::Rising });
    }

    #[test]
    fn missing_from_every_snapshot_is_new() {
        let current = repos(&["fresh", "A"]);
        let history = vec![
            snapshot(3, &["A"]),
            snapshot(2, &["B"]),
            snapshot(1, &["C", "D", "E"]),
        ];

        let ranked = reconcile(&current, &history);
        assert_eq!(ranked[0].trend, Trend::New);
        assert!(ranked[0].trend.is_new());
        assert!(!ranked[1].trend.is_new());
    }

    #[test]
    fn no_history_marks_everything_new() {
        let ranked = reconcile(&repos(&["A", "B"]), &[]);
        assert!(ranked.iter().all(|r| r.trend == Trend::New));
    }

    #[test]
    fn most_recent_snapshot_wins() {
        let current = repos(&["X", "A"]);
        // A was 1st last week and 5th the week before; only last week counts.
        let history = vec![
            snapshot(2, &["A", "X"]),
            snapshot(1, &["p", "q", "r", "s", "A"]),
        ];

        let ranked = reconcile(&current, &history);
        assert_eq!(ranked[1].trend, Trend::Known { previous_rank: 1, status: TrendStatus::Falling });
        assert_eq!(ranked[0].trend, Trend::Known { previous_rank: 2, status: TrendStatus::Rising });
    }

    #[test]
    fn older_snapshot_used_when_recent_lacks_item() {
        let current = repos(&["A"]);
        let history = vec![snapshot(2, &["B"]), snapshot(1, &["C", "A"])];

        let ranked = reconcile(&current, &history);
        assert_eq!(ranked[0].trend, Trend::Known { previous_rank: 2, status: TrendStatus::Rising });
    }

    #[test]
    fn order_and_ranks_preserved() {
        let current = repos(&["C", "A", "B"]);
        let ranked = reconcile(&current, &[snapshot(1, &["A"])]);
        let names: Vec<_> = ranked.iter().map(|r| r.repository.full_name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(ranked.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn every_output_has_exactly_one_trend_shape() {
        let current = repos(&["A", "B", "C", "D"]);
        let history = vec![snapshot(2, &["D", "C"]), snapshot(1, &["B"])];

        for ranked in reconcile(&current, &history) {
            let wire = serde_json::to_value(&ranked.trend).unwrap();
            let is_new = wire["is_new"].as_bool().unwrap();
            assert_eq!(is_new, wire.get("status").is_none());
        }
    }

    #[test]
    fn duplicate_key_in_snapshot_keeps_last_position() {
        let snap = snapshot(1, &["A", "B", "A"]);
        assert_eq!(snap.rank_of("A"), Some(3));
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn trend_serializes_flat_with_repository() {
        let ranked = reconcile(&repos(&["owner/repo"]), &[]);
        let value = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(value["full_name"], "owner/repo");
        assert_eq!(value["rank"], 1);
        assert_eq!(value["trend"], serde_json::json!({ "is_new": true }));
    }
}
