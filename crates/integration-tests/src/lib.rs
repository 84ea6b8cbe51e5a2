//! Shared fixtures for the cross-crate test suites in `tests/`.

use chrono::{DateTime, Utc};
use cm_auth_simple::{hash_passphrase, PassphraseGate};
use cm_core::models::{Condition, Listing, ListingDraft, ListingStatus, Tag};
use cm_core::traits::ManualClock;
use cm_services::Marketplace;
use cm_store_local::{MemoryStore, StaticSeed};
use secrecy::SecretString;
use std::sync::Arc;

pub const ADMIN_PASSPHRASE: &str = "bookworm-admin";

pub fn at(s: &str) -> DateTime<Utc> {
    s.parse().expect("fixture timestamps are RFC 3339")
}

pub fn listing(id: &str, title: &str, department: &str, price: f64, created: &str) -> Listing {
    Listing {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        tag: Tag::Book,
        images: vec![],
        department: department.to_string(),
        course_code: format!("{department}101"),
        condition: Condition::Used,
        price,
        negotiable: true,
        status: ListingStatus::Available,
        seller_name: "Seed Seller".to_string(),
        seller_contact: "seed@example.com".to_string(),
        location_hint: None,
        created_at: at(created),
        bumped_at: None,
    }
}

pub fn draft(title: &str, department: &str, price: f64) -> ListingDraft {
    ListingDraft {
        title: title.to_string(),
        description: String::new(),
        tag: Tag::Book,
        images: vec![],
        department: department.to_string(),
        course_code: format!("{department}201"),
        condition: Condition::NewIsh,
        price,
        negotiable: false,
        seller_name: "Mitu".to_string(),
        seller_contact: "01555123456".to_string(),
        location_hint: None,
    }
}

/// A marketplace over an in-memory backend with a hand-driven clock.
pub struct TestMarket {
    pub market: Marketplace,
    pub clock: Arc<ManualClock>,
    pub backend: Arc<MemoryStore>,
}

pub fn market_with(seed: Vec<Listing>, now: &str) -> TestMarket {
    let backend = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(at(now)));
    let hash = hash_passphrase(ADMIN_PASSPHRASE).expect("hashing fixture passphrase");
    let gate = Arc::new(PassphraseGate::new(Some(SecretString::from(hash))));
    let market = Marketplace::new(backend.clone(), Arc::new(StaticSeed::new(seed)), gate, clock.clone());
    TestMarket { market, clock, backend }
}
