//! Pure, side-effect-free transforms over an in-memory record list.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Record, RecordStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    Category,
    Value,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

/// Stable sort by a named field and direction, natural ordering per field.
pub fn sort_records(records: &mut [Record], field: SortField, dir: SortDir) {
    records.sort_by(|a, b| {
        let ord = match field {
            SortField::Title => a.title.cmp(&b.title),
            SortField::Category => a.category.cmp(&b.category),
            SortField::Value => a.value.total_cmp(&b.value),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        match dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
}

/// Filter criteria, combined conjunctively. Absent criteria (and an empty
/// search string) are no-ops.
#[derive(Debug, Default, Clone)]
pub struct RecordFilter {
    pub category: Option<String>,
    pub status: Option<RecordStatus>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<OffsetDateTime>,
    /// Inclusive upper bound on `created_at`.
    pub created_to: Option<OffsetDateTime>,
    /// Case-insensitive substring over title, description and category.
    pub search: Option<String>,
}

pub fn filter_records(records: Vec<Record>, filter: &RecordFilter) -> Vec<Record> {
    records
        .into_iter()
        .filter(|r| {
            if let Some(category) = &filter.category {
                if &r.category != category {
                    return false;
                }
            }
            if let Some(status) = filter.status {
                if r.status != status {
                    return false;
                }
            }
            if let Some(from) = filter.created_from {
                if r.created_at < from {
                    return false;
                }
            }
            if let Some(to) = filter.created_to {
                if r.created_at > to {
                    return false;
                }
            }
            if let Some(search) = &filter.search {
                let needle = search.to_lowercase();
                if !needle.is_empty() {
                    let haystack =
                        format!("{} {} {}", r.title, r.description, r.category).to_lowercase();
                    if !haystack.contains(&needle) {
                        return false;
                    }
                }
            }
            true
        })
        .collect()
}

/// Aggregate statistics over a record list.
#[derive(Debug, Serialize, PartialEq)]
pub struct RecordStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub total_value: f64,
    pub avg_value: f64,
}

pub fn record_stats(records: &[Record]) -> RecordStats {
    let total = records.len();
    let active = records
        .iter()
        .filter(|r| r.status == RecordStatus::Active)
        .count();
    let total_value: f64 = records.iter().map(|r| r.value).sum();
    let avg_value = if total == 0 {
        0.0
    } else {
        total_value / total as f64
    };
    RecordStats {
        total,
        active,
        inactive: total - active,
        total_value,
        avg_value,
    }
}

/// Deduplicated categories, lexicographically sorted.
pub fn unique_categories(records: &[Record]) -> Vec<String> {
    let mut categories: Vec<String> = records.iter().map(|r| r.category.clone()).collect();
    categories.sort();
    categories.dedup();
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn record(title: &str, category: &str, value: f64, status: RecordStatus) -> Record {
        let now = OffsetDateTime::now_utc();
        Record {
            id: title.to_lowercase(),
            user_id: "u1".into(),
            title: title.into(),
            description: format!("{} description", title),
            category: category.into(),
            value,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record("Invoice", "Finance", 10.0, RecordStatus::Active),
            record("Budget", "Finance", 20.0, RecordStatus::Inactive),
            record("Roster", "Ops", 30.0, RecordStatus::Active),
        ]
    }

    #[test]
    fn sorting_is_reversible_for_distinct_keys() {
        let mut asc = sample();
        sort_records(&mut asc, SortField::Value, SortDir::Asc);
        let mut desc = sample();
        sort_records(&mut desc, SortField::Value, SortDir::Desc);

        let asc_ids: Vec<_> = asc.iter().map(|r| r.id.clone()).collect();
        let mut desc_ids: Vec<_> = desc.iter().map(|r| r.id.clone()).collect();
        desc_ids.reverse();
        assert_eq!(asc_ids, desc_ids);
    }

    #[test]
    fn sorting_is_stable_for_equal_keys() {
        let mut records = sample();
        // two Finance entries keep their relative order under category sort
        sort_records(&mut records, SortField::Category, SortDir::Asc);
        assert_eq!(records[0].title, "Invoice");
        assert_eq!(records[1].title, "Budget");
        assert_eq!(records[2].title, "Roster");
    }

    #[test]
    fn filters_compose_conjunctively() {
        let filtered = filter_records(
            sample(),
            &RecordFilter {
                category: Some("Finance".into()),
                status: Some(RecordStatus::Active),
                ..Default::default()
            },
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Invoice");
    }

    #[test]
    fn empty_search_is_a_noop() {
        let filtered = filter_records(
            sample(),
            &RecordFilter {
                search: Some(String::new()),
                ..Default::default()
            },
        );
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn search_is_case_insensitive_over_all_text_fields() {
        let by_title = filter_records(
            sample(),
            &RecordFilter {
                search: Some("inVOICE".into()),
                ..Default::default()
            },
        );
        assert_eq!(by_title.len(), 1);

        let by_category = filter_records(
            sample(),
            &RecordFilter {
                search: Some("ops".into()),
                ..Default::default()
            },
        );
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].title, "Roster");
    }

    #[test]
    fn date_range_is_inclusive() {
        let records = sample();
        let created = records[0].created_at;

        let inside = filter_records(
            records.clone(),
            &RecordFilter {
                created_from: Some(created),
                created_to: Some(created),
                ..Default::default()
            },
        );
        assert_eq!(inside.len(), 3);

        let outside = filter_records(
            records,
            &RecordFilter {
                created_to: Some(created - Duration::days(1)),
                ..Default::default()
            },
        );
        assert!(outside.is_empty());
    }

    #[test]
    fn stats_match_expected_aggregates() {
        let records = vec![
            record("A", "General", 10.0, RecordStatus::Active),
            record("B", "General", 20.0, RecordStatus::Inactive),
        ];
        let stats = record_stats(&records);
        assert_eq!(
            stats,
            RecordStats {
                total: 2,
                active: 1,
                inactive: 1,
                total_value: 30.0,
                avg_value: 15.0,
            }
        );
    }

    #[test]
    fn stats_on_empty_list() {
        let stats = record_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.total_value, 0.0);
        assert_eq!(stats.avg_value, 0.0);
    }

    #[test]
    fn categories_are_deduped_and_sorted() {
        assert_eq!(unique_categories(&sample()), vec!["Finance", "Ops"]);
        assert!(unique_categories(&[]).is_empty());
    }
}
