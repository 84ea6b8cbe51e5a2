//! Saved-search predicates shared by alerts and the saved-search list.

use crate::filter::{FilterState, ListingFilter, SortMode};
use crate::models::{Listing, SavedSearch};
use chrono::{DateTime, Utc};

/// Name used when a search has nothing worth describing.
pub const UNTITLED_SEARCH: &str = "Untitled Search";

const NAME_SEPARATOR: &str = " • ";

/// Listings a saved search currently matches. Only `Available` listings are
/// ever returned, whatever the snapshot says.
pub fn matching_listings<'a>(search: &SavedSearch, listings: &'a [Listing]) -> Vec<&'a Listing> {
    listings
        .iter()
        .filter(|l| search.filters.matches(l) && l.is_available())
        .collect()
}

/// Matches created strictly after `watermark`.
pub fn new_matches_since<'a>(
    search: &SavedSearch,
    listings: &'a [Listing],
    watermark: DateTime<Utc>,
) -> Vec<&'a Listing> {
    matching_listings(search, listings)
        .into_iter()
        .filter(|l| l.created_at > watermark)
        .collect()
}

/// Builds a display name from the search term, department, course code and tag.
pub fn generate_search_name(filter: &ListingFilter) -> String {
    let filter = filter.normalized();
    let mut parts: Vec<String> = Vec::new();
    if let Some(term) = &filter.search {
        parts.push(format!("\"{term}\""));
    }
    if let Some(department) = &filter.department {
        parts.push(department.clone());
    }
    if let Some(code) = &filter.course_code {
        parts.push(code.clone());
    }
    if let Some(tag) = filter.tag {
        parts.push(tag.to_string());
    }

    if parts.is_empty() {
        UNTITLED_SEARCH.to_string()
    } else {
        parts.join(NAME_SEPARATOR)
    }
}

/// Expands a stored snapshot back into a browse state, keeping `sort`.
pub fn expand(search: &SavedSearch, sort: SortMode) -> FilterState {
    FilterState::new(search.filters.clone(), sort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, ListingStatus, Tag};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn listing(id: &str, department: &str, status: ListingStatus, created: &str) -> Listing {
        Listing {
            id: id.into(),
            title: "Data Structures".into(),
            description: String::new(),
            tag: Tag::Book,
            images: vec![],
            department: department.into(),
            course_code: "CSE225".into(),
            condition: Condition::Used,
            price: 450.0,
            negotiable: true,
            status,
            seller_name: "Tanvir".into(),
            seller_contact: "tanvir@example.com".into(),
            location_hint: None,
            created_at: ts(created),
            bumped_at: None,
        }
    }

    fn search(filters: ListingFilter) -> SavedSearch {
        SavedSearch {
            id: "s1".into(),
            name: "test".into(),
            filters,
            created_at: ts("2024-01-01T00:00:00Z"),
            notifications_enabled: true,
        }
    }

    #[test]
    fn only_available_listings_match() {
        let all = vec![
            listing("a", "CSE", ListingStatus::Available, "2024-01-01T00:00:00Z"),
            listing("r", "CSE", ListingStatus::Reserved, "2024-01-01T00:00:00Z"),
            listing("s", "CSE", ListingStatus::Sold, "2024-01-01T00:00:00Z"),
        ];
        let s = search(ListingFilter::default());
        let found: Vec<&str> = matching_listings(&s, &all).iter().map(|l| l.id.as_str()).collect();
        assert_eq!(found, ["a"]);
    }

    #[test]
    fn snapshot_constraints_apply() {
        let all = vec![
            listing("cse", "CSE", ListingStatus::Available, "2024-01-01T00:00:00Z"),
            listing("eee", "EEE", ListingStatus::Available, "2024-01-01T00:00:00Z"),
        ];
        let s = search(ListingFilter { department: Some("CSE".into()), ..Default::default() });
        assert_eq!(matching_listings(&s, &all).len(), 1);
    }

    #[test]
    fn watermark_is_strict() {
        let all = vec![
            listing("at", "CSE", ListingStatus::Available, "2024-02-01T00:00:00Z"),
            listing("after", "CSE", ListingStatus::Available, "2024-02-01T00:00:01Z"),
        ];
        let s = search(ListingFilter::default());
        let found = new_matches_since(&s, &all, ts("2024-02-01T00:00:00Z"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "after");
    }

    #[test]
    fn generated_names() {
        let full = ListingFilter {
            search: Some("algorithms".into()),
            department: Some("CSE".into()),
            course_code: Some("CSE373".into()),
            tag: Some(Tag::Book),
            min_price: Some(10.0),
            ..Default::default()
        };
        assert_eq!(generate_search_name(&full), "\"algorithms\" • CSE • CSE373 • Book");

        let price_only = ListingFilter { max_price: Some(200.0), ..Default::default() };
        assert_eq!(generate_search_name(&price_only), UNTITLED_SEARCH);
    }

    #[test]
    fn expand_keeps_callers_sort() {
        let s = search(ListingFilter { tag: Some(Tag::Classnotes), ..Default::default() });
        let state = expand(&s, SortMode::PriceHigh);
        assert_eq!(state.sort, SortMode::PriceHigh);
        assert_eq!(state.filter.tag, Some(Tag::Classnotes));
    }
}
