//! Seller profile statistics derived from the listing collection.

use crate::models::{Listing, ListingStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrustLevel {
    Trusted,
    Active,
    New,
}

impl TrustLevel {
    pub fn label(&self) -> &'static str {
        match self {
            TrustLevel::Trusted => "Trusted Seller",
            TrustLevel::Active => "Active Seller",
            TrustLevel::New => "New Seller",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerStats {
    pub total_listings: usize,
    pub sold_count: usize,
    pub available_count: usize,
    /// Rounded to the nearest whole unit; zero when the seller has no listings.
    pub avg_price: i64,
    pub departments: Vec<String>,
    pub member_since: Option<DateTime<Utc>>,
    pub trust: TrustLevel,
}

/// Aggregates listings whose seller name OR contact matches, ignoring case.
pub fn seller_stats(listings: &[Listing], seller_name: &str, seller_contact: &str) -> SellerStats {
    let name = seller_name.to_lowercase();
    let contact = seller_contact.to_lowercase();
    let own: Vec<&Listing> = listings
        .iter()
        .filter(|l| l.seller_name.to_lowercase() == name || l.seller_contact.to_lowercase() == contact)
        .collect();

    let sold_count = own.iter().filter(|l| l.status == ListingStatus::Sold).count();
    let available_count = own.iter().filter(|l| l.is_available()).count();
    let avg_price = if own.is_empty() {
        0
    } else {
        (own.iter().map(|l| l.price).sum::<f64>() / own.len() as f64).round() as i64
    };

    let mut departments: Vec<String> = Vec::new();
    for l in &own {
        if !departments.contains(&l.department) {
            departments.push(l.department.clone());
        }
    }

    let trust = if sold_count >= 5 {
        TrustLevel::Trusted
    } else if own.len() >= 3 {
        TrustLevel::Active
    } else {
        TrustLevel::New
    };

    SellerStats {
        total_listings: own.len(),
        sold_count,
        available_count,
        avg_price,
        departments,
        member_since: own.iter().map(|l| l.created_at).min(),
        trust,
    }
}
