//! Posting listings and the seller-side status transitions.

use crate::store::MarketStore;
use cm_core::error::{AppError, Result};
use cm_core::filter::{apply, FilterState};
use cm_core::models::{generate_id, Listing, ListingDraft, ListingStatus, MAX_IMAGES};
use cm_core::session::SessionOwnership;
use cm_core::traits::{Clock, Collection};
use std::sync::Arc;

pub struct ListingService {
    store: Arc<MarketStore>,
    clock: Arc<dyn Clock>,
}

impl ListingService {
    pub fn new(store: Arc<MarketStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn all(&self) -> Vec<Listing> {
        self.store.listings().await
    }

    pub async fn get(&self, id: &str) -> Result<Listing> {
        self.store
            .listings()
            .await
            .into_iter()
            .find(|l| l.id == id)
            .ok_or_else(|| AppError::not_found("Listing", id))
    }

    /// Filtered and sorted view of the current collection.
    pub async fn browse(&self, state: &FilterState) -> Vec<Listing> {
        apply(&self.store.listings().await, state)
    }

    /// Validates and stores a new listing at the front of the collection,
    /// then grants `session` the right to edit it.
    pub async fn post(&self, session: &mut SessionOwnership, draft: ListingDraft) -> Result<Listing> {
        let listing = self.build(draft)?;

        let mut listings: Vec<Listing> = self.store.load(Collection::Listings).await?;
        listings.insert(0, listing.clone());
        self.store.put(Collection::Listings, &listings).await?;
        session.mark_created(listing.id.as_str());

        if let Err(e) = self.record_session_listing(&listing.id).await {
            tracing::warn!(id = %listing.id, error = %e, "could not record session listing");
        }

        tracing::info!(id = %listing.id, title = %listing.title, "listing posted");
        Ok(listing)
    }

    async fn record_session_listing(&self, id: &str) -> Result<()> {
        let mut created: Vec<String> = self.store.load(Collection::SessionListings).await?;
        if created.iter().any(|c| c == id) {
            return Ok(());
        }
        created.push(id.to_string());
        self.store.put(Collection::SessionListings, &created).await
    }

    pub async fn mark_sold(&self, session: &SessionOwnership, id: &str) -> Result<Listing> {
        self.transition(session, id, ListingStatus::Sold).await
    }

    pub async fn mark_reserved(&self, session: &SessionOwnership, id: &str) -> Result<Listing> {
        self.transition(session, id, ListingStatus::Reserved).await
    }

    /// Moves a listing to the top of the "bumped" ordering.
    pub async fn bump(&self, session: &SessionOwnership, id: &str) -> Result<Listing> {
        let mut listings: Vec<Listing> = self.store.load(Collection::Listings).await?;
        let listing = find_editable(&mut listings, session, id)?;
        listing.bumped_at = Some(self.clock.now());
        let updated = listing.clone();

        self.store.put(Collection::Listings, &listings).await?;
        tracing::info!(id, "listing bumped");
        Ok(updated)
    }

    async fn transition(&self, session: &SessionOwnership, id: &str, to: ListingStatus) -> Result<Listing> {
        let mut listings: Vec<Listing> = self.store.load(Collection::Listings).await?;
        let listing = find_editable(&mut listings, session, id)?;
        if listing.status != ListingStatus::Available {
            return Err(AppError::Conflict(format!(
                "listing {id} is {} and cannot become {to}",
                listing.status
            )));
        }
        listing.status = to;
        let updated = listing.clone();

        self.store.put(Collection::Listings, &listings).await?;
        tracing::info!(id, status = %to, "listing status changed");
        Ok(updated)
    }

    fn build(&self, draft: ListingDraft) -> Result<Listing> {
        if draft.title.trim().is_empty() {
            return Err(AppError::validation("title", "Title is required"));
        }
        if draft.department.trim().is_empty() {
            return Err(AppError::validation("department", "Department is required"));
        }
        if draft.seller_name.trim().is_empty() {
            return Err(AppError::validation("seller_name", "Your name is required"));
        }
        if draft.seller_contact.trim().is_empty() {
            return Err(AppError::validation("seller_contact", "Contact info is required"));
        }
        if !draft.price.is_finite() || draft.price < 0.0 {
            return Err(AppError::validation("price", "Valid price is required"));
        }
        if draft.images.len() > MAX_IMAGES {
            return Err(AppError::validation(
                "images",
                format!("at most {MAX_IMAGES} images are allowed"),
            ));
        }

        let location_hint = draft
            .location_hint
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        Ok(Listing {
            id: generate_id(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            tag: draft.tag,
            images: draft.images,
            department: draft.department.trim().to_string(),
            course_code: draft.course_code.trim().to_uppercase(),
            condition: draft.condition,
            price: draft.price,
            negotiable: draft.negotiable,
            status: ListingStatus::Available,
            seller_name: draft.seller_name.trim().to_string(),
            seller_contact: draft.seller_contact.trim().to_string(),
            location_hint,
            created_at: self.clock.now(),
            bumped_at: None,
        })
    }
}

fn find_editable<'a>(
    listings: &'a mut [Listing],
    session: &SessionOwnership,
    id: &str,
) -> Result<&'a mut Listing> {
    let listing = listings
        .iter_mut()
        .find(|l| l.id == id)
        .ok_or_else(|| AppError::not_found("Listing", id))?;
    if !session.is_editable(id) {
        return Err(AppError::Unauthorized(format!(
            "listing {id} was not posted in this session"
        )));
    }
    Ok(listing)
}
