//! # Domain Models
//!
//! These structs represent the core entities of the marketplace.
//! Generated ids are UUID v7 strings; ids arriving from seed or imported
//! documents are kept verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Upper bound on the number of images attached to a listing.
pub const MAX_IMAGES: usize = 6;

/// Generates a fresh, time-ordered record id.
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// What kind of material is being sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Book,
    Classnotes,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Book => "Book",
            Tag::Classnotes => "Classnotes",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "book" => Ok(Tag::Book),
            "classnotes" => Ok(Tag::Classnotes),
            other => Err(format!("unknown tag '{other}'")),
        }
    }
}

/// Physical condition as declared by the seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "New-ish")]
    NewIsh,
    Used,
    Rough,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::NewIsh => "New-ish",
            Condition::Used => "Used",
            Condition::Rough => "Rough",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "new-ish" | "newish" => Ok(Condition::NewIsh),
            "used" => Ok(Condition::Used),
            "rough" => Ok(Condition::Rough),
            other => Err(format!("unknown condition '{other}'")),
        }
    }
}

/// Availability of a listing. Only `Available` listings can change status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ListingStatus {
    #[default]
    Available,
    Reserved,
    Sold,
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListingStatus::Available => "Available",
            ListingStatus::Reserved => "Reserved",
            ListingStatus::Sold => "Sold",
        };
        f.write_str(s)
    }
}

/// A single item offered for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub tag: Tag,
    /// Encoded thumbnails (data URLs) or remote image URLs, at most `MAX_IMAGES`.
    #[serde(default)]
    pub images: Vec<String>,
    pub department: String,
    #[serde(default)]
    pub course_code: String,
    pub condition: Condition,
    pub price: f64,
    #[serde(default)]
    pub negotiable: bool,
    #[serde(default)]
    pub status: ListingStatus,
    pub seller_name: String,
    pub seller_contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_hint: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bumped_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// The timestamp used for sorting listings by activity.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.bumped_at.unwrap_or(self.created_at)
    }

    pub fn is_available(&self) -> bool {
        self.status == ListingStatus::Available
    }
}

/// Seller input for a new listing, before id/status/timestamps are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub tag: Tag,
    #[serde(default)]
    pub images: Vec<String>,
    pub department: String,
    #[serde(default)]
    pub course_code: String,
    pub condition: Condition,
    pub price: f64,
    #[serde(default)]
    pub negotiable: bool,
    pub seller_name: String,
    pub seller_contact: String,
    #[serde(default)]
    pub location_hint: Option<String>,
}

/// A user-submitted complaint about a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    /// Not enforced to reference an existing listing.
    pub listing_id: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A named filter snapshot with an alert toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: String,
    pub name: String,
    /// Sparse projection: only constrained fields are stored.
    pub filters: crate::filter::ListingFilter,
    pub created_at: DateTime<Utc>,
    pub notifications_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_uses_display_spelling_on_the_wire() {
        let json = serde_json::to_string(&Condition::NewIsh).unwrap();
        assert_eq!(json, "\"New-ish\"");
        let parsed: Condition = serde_json::from_str("\"Rough\"").unwrap();
        assert_eq!(parsed, Condition::Rough);
    }

    #[test]
    fn listing_omits_absent_optionals() {
        let listing = Listing {
            id: generate_id(),
            title: "Calculus".into(),
            description: String::new(),
            tag: Tag::Book,
            images: vec![],
            department: "MAT".into(),
            course_code: "MAT120".into(),
            condition: Condition::Used,
            price: 300.0,
            negotiable: false,
            status: ListingStatus::Available,
            seller_name: "Rafi".into(),
            seller_contact: "rafi@example.com".into(),
            location_hint: None,
            created_at: Utc::now(),
            bumped_at: None,
        };
        let value = serde_json::to_value(&listing).unwrap();
        assert!(value.get("location_hint").is_none());
        assert!(value.get("bumped_at").is_none());
        assert_eq!(value["status"], "Available");
    }

    #[test]
    fn last_activity_prefers_bump() {
        let created = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let bumped = "2024-02-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let json = serde_json::json!({
            "id": "a", "title": "t", "tag": "Classnotes", "department": "CSE",
            "condition": "New-ish", "price": 10, "seller_name": "s",
            "seller_contact": "c", "created_at": created, "bumped_at": bumped,
        });
        let listing: Listing = serde_json::from_value(json).unwrap();
        assert_eq!(listing.last_activity(), bumped);
        assert_eq!(listing.status, ListingStatus::Available);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
