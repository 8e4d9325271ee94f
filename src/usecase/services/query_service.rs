use std::rc::Rc;

use crate::domain::entities::dataset::{PageQuery, PageResult, SortDirection};
use crate::domain::entities::row::{compare_values, display_value, Row};
use crate::usecase::ports::source::FetchError;
use crate::usecase::services::dataset_cache::DatasetCache;

fn matches_search(row: &Row, needle_lower: &str) -> bool {
    row.fields()
        .values()
        .any(|value| display_value(value).to_lowercase().contains(needle_lower))
}

fn matches_filters(row: &Row, query: &PageQuery) -> bool {
    query.filters.iter().all(|(field, expected)| {
        row.get(field)
            .is_some_and(|value| display_value(value) == expected.as_str())
    })
}

/// Filter, sort and slice one page out of the full dataset.
///
/// The whole dataset is re-filtered and re-sorted for every page.
pub fn run_query(rows: &[Row], query: &PageQuery, page_size: usize) -> PageResult {
    let page_size = page_size.max(1);
    let needle = query.search_term.to_lowercase();

    let mut filtered: Vec<&Row> = rows
        .iter()
        .filter(|row| needle.is_empty() || matches_search(row, &needle))
        .filter(|row| matches_filters(row, query))
        .collect();

    if let Some(sort) = &query.sort {
        // sort_by is stable: ties keep their filtered order in both directions.
        filtered.sort_by(|a, b| {
            let ordering = compare_values(a.get(&sort.field), b.get(&sort.field));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    let total = filtered.len();
    let start = query.page.saturating_mul(page_size);
    let end = start.saturating_add(page_size);
    let page_rows = if start >= total {
        Vec::new()
    } else {
        filtered[start..end.min(total)]
            .iter()
            .map(|row| (*row).clone())
            .collect()
    };

    PageResult {
        rows: page_rows,
        has_more: end < total,
        total,
    }
}

pub struct QueryService {
    cache: Rc<DatasetCache>,
    page_size: usize,
}

impl QueryService {
    pub fn new(cache: Rc<DatasetCache>, page_size: usize) -> Self {
        Self {
            cache,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub async fn query_page(&self, query: &PageQuery) -> Result<PageResult, FetchError> {
        let snapshot = self.cache.full_dataset().await?;
        let result = run_query(&snapshot, query, self.page_size);
        tracing::debug!(
            page = query.page,
            search = %query.search_term,
            rows = result.rows.len(),
            total = result.total,
            "query page"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::dataset::SortSpec;
    use crate::testing::{sample_records, QueuedSource};
    use crate::usecase::services::row_transformer::transform_records;
    use futures::executor::block_on;
    use proptest::prelude::*;
    use serde_json::json;

    fn dataset(count: usize) -> Vec<Row> {
        transform_records(&sample_records(count))
    }

    fn ids(result: &PageResult) -> Vec<String> {
        result
            .rows
            .iter()
            .map(|row| row.id().as_str().to_string())
            .collect()
    }

    #[test]
    fn first_and_last_page_of_120_rows() {
        let rows = dataset(120);

        let first = run_query(&rows, &PageQuery::first_page(), 50);
        assert_eq!(first.rows.len(), 50);
        assert!(first.has_more);
        assert_eq!(first.total, 120);

        let last = run_query(
            &rows,
            &PageQuery {
                page: 2,
                ..PageQuery::default()
            },
            50,
        );
        assert_eq!(last.rows.len(), 20);
        assert!(!last.has_more);
        assert_eq!(last.total, 120);
        assert_eq!(last.rows[0].id().as_str(), "u100");
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let rows = dataset(10);
        let result = run_query(
            &rows,
            &PageQuery {
                page: 7,
                ..PageQuery::default()
            },
            50,
        );
        assert!(result.rows.is_empty());
        assert!(!result.has_more);
        assert_eq!(result.total, 10);
    }

    #[test]
    fn search_is_case_insensitive_substring_over_all_fields() {
        let rows = transform_records(&[
            json!({"id": "1", "language": "Toledo"}),
            json!({"id": "2", "language": "Austin", "note": null}),
            json!({"id": "3", "city": "TOLEDO"}),
        ]);

        let result = run_query(
            &rows,
            &PageQuery {
                search_term: "toledo".to_string(),
                ..PageQuery::default()
            },
            50,
        );

        assert_eq!(ids(&result), vec!["1", "3"]);
    }

    #[test]
    fn search_tolerates_null_values() {
        let rows = transform_records(&[json!({"id": "1", "extra": null, "tags": [1, null]})]);
        let result = run_query(
            &rows,
            &PageQuery {
                search_term: "NULL".to_string(),
                ..PageQuery::default()
            },
            50,
        );
        assert_eq!(result.total, 1);
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let rows = transform_records(&[
            json!({"id": "a", "state": "pause"}),
            json!({"id": "b", "state": "active"}),
            json!({"id": "c", "state": "pause"}),
            json!({"id": "d", "state": "active"}),
            json!({"id": "e", "state": "served"}),
        ]);

        let mut query = PageQuery {
            sort: Some(SortSpec {
                field: "state".to_string(),
                direction: SortDirection::Asc,
            }),
            ..PageQuery::default()
        };
        let asc = run_query(&rows, &query, 50);
        assert_eq!(ids(&asc), vec!["b", "d", "a", "c", "e"]);

        if let Some(sort) = query.sort.as_mut() {
            sort.direction = SortDirection::Desc;
        }
        let desc = run_query(&rows, &query, 50);
        assert_eq!(ids(&desc), vec!["e", "a", "c", "b", "d"]);
    }

    #[test]
    fn numbers_sort_numerically() {
        let rows = transform_records(&[
            json!({"id": "a", "score": 10}),
            json!({"id": "b", "score": 9}),
            json!({"id": "c"}),
        ]);
        let result = run_query(
            &rows,
            &PageQuery {
                sort: Some(SortSpec {
                    field: "score".to_string(),
                    direction: SortDirection::Asc,
                }),
                ..PageQuery::default()
            },
            50,
        );
        assert_eq!(ids(&result), vec!["c", "b", "a"]);
    }

    #[test]
    fn column_filters_match_exactly_and_combine_with_search() {
        let rows = dataset(12);
        let mut query = PageQuery::default();
        query.filters.insert("state".to_string(), "pause".to_string());

        let paused = run_query(&rows, &query, 50);
        assert_eq!(paused.total, 4);
        assert!(paused.rows.iter().all(|row| row.display("state") == "pause"));

        query.search_term = "toledo".to_string();
        let paused_in_toledo = run_query(&rows, &query, 50);
        assert_eq!(ids(&paused_in_toledo), vec!["u001"]);
    }

    #[test]
    fn query_page_reads_through_the_cache() {
        let source = QueuedSource::new(vec![Ok(sample_records(75))]);
        let service = QueryService::new(Rc::new(DatasetCache::new(source.clone())), 50);

        let first = block_on(service.query_page(&PageQuery::first_page()))
            .expect("first page should load");
        let second = block_on(service.query_page(&PageQuery {
            page: 1,
            ..PageQuery::default()
        }))
        .expect("second page should load");

        assert_eq!(first.rows.len(), 50);
        assert_eq!(second.rows.len(), 25);
        assert!(!second.has_more);
        assert_eq!(source.calls(), 1);
    }

    proptest! {
        #[test]
        fn pages_partition_the_filtered_rows(count in 0usize..260, page_size in 1usize..80) {
            let rows = dataset(count);
            let mut seen = 0;
            let mut page = 0;
            loop {
                let result = run_query(&rows, &PageQuery { page, ..PageQuery::default() }, page_size);
                prop_assert_eq!(result.total, count);
                prop_assert!(result.rows.len() <= page_size);
                seen += result.rows.len();
                prop_assert_eq!(result.has_more, (page + 1) * page_size < count);
                if !result.has_more {
                    break;
                }
                page += 1;
            }
            prop_assert_eq!(seen, count);
        }
    }
}
