// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use url::form_urlencoded;

use crate::model::{FilterState, StatusFilter};

/// Ordered query parameters for `/api/protocols`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    fn push(&mut self, key: &'static str, value: impl Into<String>) {
        self.pairs.push((key, value.into()));
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter().map(|(key, value)| (*key, value.as_str())))
            .finish()
    }
}

pub fn build_query(filter: &FilterState) -> QueryParams {
    let mut params = QueryParams::default();

    let search = filter.search_term();
    if !search.is_empty() {
        params.push("search", search);
    }

    match filter.status {
        StatusFilter::Archived | StatusFilter::NotArchived => {
            params.push("status", filter.status.as_str());
        }
        StatusFilter::Amabre => params.push("amabre", "true"),
        StatusFilter::All => {}
    }

    if filter.keyword_filter {
        params.push("filter_keywords", "true");
    }

    params.push("sort_order", filter.sort_order.as_str());
    params
}

#[cfg(test)]
mod tests {
    use super::build_query;
    use crate::model::{FilterState, SortOrder, StatusFilter};

    #[test]
    fn full_filter_maps_to_every_parameter() {
        let params = build_query(&FilterState {
            search_text: "  foo ".to_owned(),
            status: StatusFilter::Archived,
            keyword_filter: true,
            sort_order: SortOrder::Desc,
        });

        assert_eq!(
            params.to_query_string(),
            "search=foo&status=arch&filter_keywords=true&sort_order=desc"
        );
    }

    #[test]
    fn default_filter_only_sends_sort_order() {
        let params = build_query(&FilterState::default());
        assert_eq!(params.pairs(), &[("sort_order", "asc".to_owned())]);
    }

    #[test]
    fn whitespace_search_is_dropped() {
        let params = build_query(&FilterState {
            search_text: "   ".to_owned(),
            ..FilterState::default()
        });
        assert!(!params.contains("search"));
    }

    #[test]
    fn status_and_amabre_never_co_occur() {
        for status in StatusFilter::ALL {
            for keyword_filter in [false, true] {
                for sort_order in [SortOrder::Asc, SortOrder::Desc] {
                    let params = build_query(&FilterState {
                        search_text: "x".to_owned(),
                        status,
                        keyword_filter,
                        sort_order,
                    });
                    assert!(
                        !(params.contains("status") && params.contains("amabre")),
                        "{status:?} produced both status and amabre"
                    );
                    assert_eq!(params.get("sort_order"), Some(sort_order.as_str()));
                    assert_eq!(params.contains("filter_keywords"), keyword_filter);
                }
            }
        }
    }

    #[test]
    fn amabre_filter_uses_its_own_flag() {
        let params = build_query(&FilterState {
            status: StatusFilter::Amabre,
            ..FilterState::default()
        });
        assert_eq!(params.get("amabre"), Some("true"));
        assert!(!params.contains("status"));

        let not_archived = build_query(&FilterState {
            status: StatusFilter::NotArchived,
            ..FilterState::default()
        });
        assert_eq!(not_archived.get("status"), Some("notarch"));
    }

    #[test]
    fn search_text_is_encoded() {
        let params = build_query(&FilterState {
            search_text: "multa & juros/2024".to_owned(),
            ..FilterState::default()
        });
        assert_eq!(params.get("search"), Some("multa & juros/2024"));
        assert_eq!(
            params.to_query_string(),
            "search=multa+%26+juros%2F2024&sort_order=asc"
        );
    }
}
