//! Buyer-to-seller contact helpers: channel detection and offer messages.

use crate::models::Listing;

const CURRENCY: &str = "৳";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactChannel {
    Email,
    Phone,
    Other,
}

impl ContactChannel {
    pub fn detect(contact: &str) -> Self {
        if contact.contains('@') {
            return ContactChannel::Email;
        }
        let digits = digits_of(contact);
        if (10..=11).contains(&digits.len()) {
            ContactChannel::Phone
        } else {
            ContactChannel::Other
        }
    }
}

fn digits_of(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// An offer a buyer is about to send. Empty optional fields are left out of
/// the rendered text.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferMessage<'a> {
    pub listing: &'a Listing,
    pub offer_price: f64,
    pub buyer_name: String,
    pub buyer_contact: String,
    pub message: String,
}

impl<'a> OfferMessage<'a> {
    /// Starts from 90% of the asking price, rounded.
    pub fn new(listing: &'a Listing) -> Self {
        Self {
            listing,
            offer_price: suggested_offer(listing.price),
            buyer_name: String::new(),
            buyer_contact: String::new(),
            message: String::new(),
        }
    }

    pub fn render(&self) -> String {
        let l = self.listing;
        let lines = [
            format!("Hi {}!", l.seller_name),
            format!("I'm interested in your listing \"{}\".", l.title),
            format!("Item: {}", l.title),
            format!("Course: {}", l.course_code),
            format!("Listed Price: {CURRENCY}{}", l.price),
            if l.negotiable {
                format!("My Offer: {CURRENCY}{}", self.offer_price)
            } else {
                String::new()
            },
            labelled("Message", &self.message),
            labelled("My Name", &self.buyer_name),
            labelled("Contact", &self.buyer_contact),
            "Looking forward to hearing from you!".to_string(),
        ];
        lines
            .into_iter()
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `None` unless the seller contact looks like a phone number.
    pub fn whatsapp_link(&self) -> Option<String> {
        if ContactChannel::detect(&self.listing.seller_contact) != ContactChannel::Phone {
            return None;
        }
        let digits = digits_of(&self.listing.seller_contact);
        let phone = match digits.strip_prefix('0') {
            Some(_) => format!("88{digits}"),
            None => digits,
        };
        Some(format!(
            "https://wa.me/{phone}?text={}",
            urlencoding::encode(&self.render())
        ))
    }

    /// `None` unless the seller contact looks like an email address.
    pub fn mailto_link(&self) -> Option<String> {
        if ContactChannel::detect(&self.listing.seller_contact) != ContactChannel::Email {
            return None;
        }
        let subject = format!("Interested in: {}", self.listing.title);
        Some(format!(
            "mailto:{}?subject={}&body={}",
            self.listing.seller_contact,
            urlencoding::encode(&subject),
            urlencoding::encode(&self.render())
        ))
    }
}

fn labelled(label: &str, value: &str) -> String {
    if value.trim().is_empty() {
        String::new()
    } else {
        format!("{label}: {}", value.trim())
    }
}

pub fn suggested_offer(price: f64) -> f64 {
    (price * 0.9).round()
}
