//! # Filter/Sort Engine
//!
//! Pure functions mapping a listing collection and a [`FilterState`] to an
//! ordered result. Every predicate is inactive while its field is absent, so
//! a default state returns the whole collection in the active sort order.

use crate::models::{Condition, Listing, Tag};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Result ordering applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Newest `created_at` first.
    #[default]
    Recent,
    PriceLow,
    PriceHigh,
    /// Newest of `bumped_at` / `created_at` first.
    Bumped,
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(SortMode::Recent),
            "price-low" => Ok(SortMode::PriceLow),
            "price-high" => Ok(SortMode::PriceHigh),
            "bumped" => Ok(SortMode::Bumped),
            other => Err(format!("unknown sort mode '{other}'")),
        }
    }
}

/// The filtering half of a search. Absent fields impose no constraint.
///
/// Serialized form is sparse: unset fields are skipped, which is exactly the
/// projection stored inside a [`crate::SavedSearch`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListingFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

fn active_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl ListingFilter {
    /// True when at least one predicate would constrain the collection.
    pub fn is_active(&self) -> bool {
        active_text(&self.search).is_some()
            || self.tag.is_some()
            || active_text(&self.department).is_some()
            || active_text(&self.course_code).is_some()
            || !self.conditions.is_empty()
            || self.min_price.is_some()
            || self.max_price.is_some()
    }

    /// Drops blank strings and repeated conditions, keeping only real constraints.
    pub fn normalized(&self) -> ListingFilter {
        let keep = |v: &Option<String>| active_text(v).map(str::to_string);
        let mut conditions: Vec<Condition> = Vec::with_capacity(self.conditions.len());
        for c in &self.conditions {
            if !conditions.contains(c) {
                conditions.push(*c);
            }
        }
        ListingFilter {
            search: keep(&self.search),
            tag: self.tag,
            department: keep(&self.department),
            course_code: keep(&self.course_code),
            conditions,
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }

    /// Evaluates every active predicate against a single listing.
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(term) = active_text(&self.search) {
            let term = term.to_lowercase();
            let hit = [
                &listing.title,
                &listing.course_code,
                &listing.seller_name,
                &listing.description,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        if let Some(tag) = self.tag {
            if listing.tag != tag {
                return false;
            }
        }

        if let Some(department) = active_text(&self.department) {
            if listing.department != department {
                return false;
            }
        }

        if let Some(code) = active_text(&self.course_code) {
            if !listing
                .course_code
                .to_lowercase()
                .contains(&code.to_lowercase())
            {
                return false;
            }
        }

        if !self.conditions.is_empty() && !self.conditions.contains(&listing.condition) {
            return false;
        }

        if let Some(min) = self.min_price {
            if listing.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if listing.price > max {
                return false;
            }
        }

        true
    }
}

/// Full browse state: what to keep and how to order it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(flatten)]
    pub filter: ListingFilter,
    #[serde(default)]
    pub sort: SortMode,
}

impl FilterState {
    pub fn new(filter: ListingFilter, sort: SortMode) -> Self {
        Self { filter, sort }
    }
}

fn compare_price(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Sorts in place. `sort_by` is stable, so equal keys keep their input order.
pub fn sort_listings(listings: &mut [Listing], mode: SortMode) {
    match mode {
        SortMode::Recent => listings.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortMode::PriceLow => listings.sort_by(|a, b| compare_price(a.price, b.price)),
        SortMode::PriceHigh => listings.sort_by(|a, b| compare_price(b.price, a.price)),
        SortMode::Bumped => listings.sort_by(|a, b| b.last_activity().cmp(&a.last_activity())),
    }
}

/// Filters then sorts a copy of `listings`.
pub fn apply(listings: &[Listing], state: &FilterState) -> Vec<Listing> {
    let mut result: Vec<Listing> = listings
        .iter()
        .filter(|l| state.filter.matches(l))
        .cloned()
        .collect();
    sort_listings(&mut result, state.sort);
    result
}
