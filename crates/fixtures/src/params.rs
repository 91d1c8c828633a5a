//! Filter vocabulary shared by every list endpoint, and the response envelopes
//! those endpoints return.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Query filters as the router extracts them from a request URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub role: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub days: Option<i64>,
    /// Endpoint-specific keys (e.g. `action`, `userId`).
    pub extra: BTreeMap<String, String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from decoded query pairs. Unparseable numbers and dates are ignored.
    pub fn from_query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        let mut page: Option<usize> = None;

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key {
                "role" => params.role = Some(value.to_string()),
                "status" => params.status = Some(value.to_string()),
                "search" | "q" => params.search = Some(value.to_string()),
                "startDate" | "start_date" | "from" => params.start_date = parse_date(key, value),
                "endDate" | "end_date" | "to" => params.end_date = parse_date(key, value),
                "limit" | "pageSize" => params.limit = value.parse().ok(),
                "offset" => params.offset = value.parse().ok(),
                "page" => page = value.parse().ok(),
                "days" => params.days = value.parse().ok(),
                _ => {
                    params.extra.insert(key.to_string(), value.to_string());
                }
            }
        }

        if params.offset.is_none() {
            if let (Some(page), Some(limit)) = (page, params.limit) {
                // An offset too large to represent is past the end of any list.
                params.offset = Some(page.saturating_sub(1).checked_mul(limit).unwrap_or(usize::MAX));
            }
        }

        params
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn role_matches(&self, role: &str) -> bool {
        matches_filter(self.role.as_deref(), role)
    }

    pub fn status_matches(&self, status: &str) -> bool {
        matches_filter(self.status.as_deref(), status)
    }

    pub fn extra_matches(&self, key: &str, value: &str) -> bool {
        matches_filter(self.extra.get(key).map(String::as_str), value)
    }

    /// Case-insensitive substring match against any of `haystacks`.
    pub fn search_matches(&self, haystacks: &[&str]) -> bool {
        match &self.search {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                haystacks.iter().any(|h| h.to_lowercase().contains(&needle))
            }
        }
    }

    pub fn date_in_range(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }

    /// `slice(offset, offset + limit)`; no limit means everything after `offset`.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = self.offset.unwrap_or(0);
        let iter = items.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }

    /// 1-based page number implied by offset and limit.
    pub fn page(&self, default_limit: usize) -> usize {
        let limit = self.limit.unwrap_or(default_limit).max(1);
        (self.offset.unwrap_or(0) / limit).saturating_add(1)
    }
}

fn matches_filter(filter: Option<&str>, value: &str) -> bool {
    filter.map_or(true, |f| f.eq_ignore_ascii_case(value))
}

fn parse_date(key: &str, value: &str) -> Option<NaiveDate> {
    // Accept full timestamps by looking at the date part only.
    let date_part = value.get(..10).unwrap_or(value);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Ignoring unparseable date filter {}={}: {}", key, value, e);
            None
        }
    }
}

/// `{ success, data, total }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, total: usize) -> Self {
        Self { success: true, data, total }
    }
}

/// `{ success, data, total, page, limit }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// `{ success, data }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ItemResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

/// Filter a candidate population, then slice it. `total` counts the filtered
/// set before slicing.
pub fn filter_and_slice<T>(
    candidates: Vec<T>,
    params: &ListParams,
    keep: impl Fn(&T) -> bool,
) -> ListResponse<T> {
    let filtered: Vec<T> = candidates.into_iter().filter(|item| keep(item)).collect();
    let total = filtered.len();
    ListResponse::new(params.paginate(filtered), total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_parses_vocabulary() {
        let params = ListParams::from_query(vec![
            ("role", "caregiver"),
            ("status", "active"),
            ("q", "smith"),
            ("startDate", "2026-01-01"),
            ("endDate", "2026-01-31T23:59:59Z"),
            ("limit", "10"),
            ("page", "3"),
            ("action", "login"),
        ]);
        assert_eq!(params.role.as_deref(), Some("caregiver"));
        assert_eq!(params.search.as_deref(), Some("smith"));
        assert_eq!(params.start_date, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(params.end_date, NaiveDate::from_ymd_opt(2026, 1, 31));
        assert_eq!(params.offset, Some(20));
        assert_eq!(params.extra.get("action").map(String::as_str), Some("login"));
    }

    #[test]
    fn test_huge_page_saturates_past_the_end() {
        let params = ListParams::from_query(vec![("page", "18446744073709551615"), ("limit", "2")]);
        assert_eq!(params.offset, Some(usize::MAX));
        assert!(params.paginate((0..10).collect::<Vec<i32>>()).is_empty());
        assert_eq!(params.page(25), usize::MAX / 2 + 1);

        let params = ListParams::new().with_offset(usize::MAX).with_limit(1);
        assert_eq!(params.page(25), usize::MAX);
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let params = ListParams::from_query(vec![("limit", "many"), ("startDate", "yesterday")]);
        assert_eq!(params.limit, None);
        assert_eq!(params.start_date, None);
    }

    #[test]
    fn test_paginate_is_a_slice() {
        let params = ListParams::new().with_offset(2).with_limit(3);
        assert_eq!(params.paginate((0..10).collect()), vec![2, 3, 4]);
        assert_eq!(ListParams::new().with_offset(8).paginate((0..10).collect()), vec![8, 9]);
    }

    #[test]
    fn test_filter_and_slice_total_counts_before_slicing() {
        let params = ListParams::new().with_limit(2);
        let response = filter_and_slice((0..10).collect(), &params, |n| n % 2 == 0);
        assert_eq!(response.total, 5);
        assert_eq!(response.data, vec![0, 2]);
    }

    #[test]
    fn test_page_number() {
        assert_eq!(ListParams::new().page(25), 1);
        assert_eq!(ListParams::new().with_offset(50).with_limit(25).page(25), 3);
    }
}
