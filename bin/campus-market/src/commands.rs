//! Command handlers. One `App` lives for the whole process, so listings
//! posted earlier in a `shell` stay editable for later commands.

use crate::cli::{
    AdminCommand, Command, OfferArgs, PostArgs, ReportCommand, SearchCommand, ShellLine,
    WishlistCommand,
};
use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use cm_core::contact::OfferMessage;
use cm_core::filter::FilterState;
use cm_core::models::{Listing, ListingDraft, Report, SavedSearch, Tag, MAX_IMAGES};
use cm_core::seller::{seller_stats, SellerStats};
use cm_core::session::SessionOwnership;
use cm_services::images::process_images;
use cm_services::Marketplace;
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub struct App {
    market: Marketplace,
    session: SessionOwnership,
    json: bool,
}

#[derive(Serialize)]
struct ListingView<'a> {
    listing: &'a Listing,
    seller: SellerStats,
    wishlisted: bool,
    editable: bool,
    reports: usize,
}

#[derive(Serialize)]
struct SearchView {
    search: SavedSearch,
    matches: usize,
}

#[derive(Serialize)]
struct OfferView {
    message: String,
    whatsapp: Option<String>,
    mailto: Option<String>,
}

impl App {
    pub fn new(market: Marketplace, json: bool) -> Self {
        Self {
            market,
            session: SessionOwnership::new(),
            json,
        }
    }

    pub async fn run(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Shell => self.shell().await,
            other => self.execute(other).await,
        }
    }

    /// Runs stdin lines as commands until EOF or `exit`. A failing command
    /// is reported and the shell carries on.
    async fn shell(&mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if matches!(line, "exit" | "quit") {
                break;
            }
            let Some(words) = shlex::split(line) else {
                eprintln!("error: unbalanced quotes");
                continue;
            };
            let parsed = match ShellLine::try_parse_from(words) {
                Ok(parsed) => parsed,
                Err(e) => {
                    let _ = e.print();
                    continue;
                }
            };
            if matches!(parsed.command, Command::Shell) {
                eprintln!("error: already in a shell");
                continue;
            }
            if let Err(e) = self.execute(parsed.command).await {
                eprintln!("error: {e:#}");
            }
        }
        tracing::debug!(posted = self.session.created_ids().len(), "shell closed");
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::List { filter, sort, saved } => {
                let state = match saved {
                    Some(id) => {
                        let search = self.market.searches.get(&id).await?;
                        self.market.searches.expand(&search, sort)
                    }
                    None => FilterState::new(filter.to_filter()?, sort),
                };
                let listings = self.market.listings.browse(&state).await;
                self.emit(&listings, || listing_table(&listings))
            }
            Command::Show { id } => self.show(&id).await,
            Command::Post(args) => self.post(args).await,
            Command::MarkSold { id } => {
                let listing = self.market.listings.mark_sold(&self.session, &id).await?;
                self.emit(&listing, || format!("{} is now {}", listing.id, listing.status))
            }
            Command::MarkReserved { id } => {
                let listing = self.market.listings.mark_reserved(&self.session, &id).await?;
                self.emit(&listing, || format!("{} is now {}", listing.id, listing.status))
            }
            Command::Bump { id } => {
                let listing = self.market.listings.bump(&self.session, &id).await?;
                self.emit(&listing, || format!("{} bumped", listing.id))
            }
            Command::Wishlist { command } => self.wishlist(command).await,
            Command::Report { command } => self.report(command).await,
            Command::Search { command } => self.search(command).await,
            Command::Seller { listing_id } => {
                let listing = self.market.listings.get(&listing_id).await?;
                let all = self.market.listings.all().await;
                let stats = seller_stats(&all, &listing.seller_name, &listing.seller_contact);
                self.emit(&stats, || seller_summary(&listing.seller_name, &stats))
            }
            Command::Offer(args) => self.offer(args).await,
            Command::Thumbnail { files } => {
                let urls = process_images(read_files(&files).await?).await?;
                self.emit(&urls, || urls.join("\n"))
            }
            Command::Admin { passphrase, command } => self.admin(&passphrase, command).await,
            Command::HashPassphrase { passphrase } => {
                let hash = cm_auth_simple::hash_passphrase(&passphrase)?;
                self.emit(&hash, || hash.clone())
            }
            Command::Shell => anyhow::bail!("already in a shell"),
        }
    }

    async fn show(&self, id: &str) -> anyhow::Result<()> {
        let listing = self.market.listings.get(id).await?;
        let all = self.market.listings.all().await;
        let view = ListingView {
            seller: seller_stats(&all, &listing.seller_name, &listing.seller_contact),
            wishlisted: self.market.wishlist.contains(id).await,
            editable: self.session.is_editable(id),
            reports: self.market.reports.for_listing(id).await.len(),
            listing: &listing,
        };
        self.emit(&view, || listing_detail(&view))
    }

    async fn post(&mut self, args: PostArgs) -> anyhow::Result<()> {
        let paths: Vec<PathBuf> = args.images.into_iter().take(MAX_IMAGES).collect();
        let images = if paths.is_empty() {
            Vec::new()
        } else {
            process_images(read_files(&paths).await?).await?
        };

        let draft = ListingDraft {
            title: args.title,
            description: args.description,
            tag: args.tag.parse::<Tag>().map_err(anyhow::Error::msg)?,
            images,
            department: args.department,
            course_code: args.course,
            condition: args.condition,
            price: args.price,
            negotiable: args.negotiable,
            seller_name: args.seller_name,
            seller_contact: args.seller_contact,
            location_hint: args.location,
        };
        let listing = self.market.listings.post(&mut self.session, draft).await?;
        self.emit(&listing, || format!("Posted {}\n{}", listing.id, listing_line(&listing)))
    }

    async fn wishlist(&self, command: WishlistCommand) -> anyhow::Result<()> {
        match command {
            WishlistCommand::Add { id } => {
                let added = self.market.wishlist.add(&id).await?;
                self.emit(&added, || {
                    if added { format!("Added {id}") } else { format!("{id} is already wishlisted") }
                })
            }
            WishlistCommand::Remove { id } => {
                let removed = self.market.wishlist.remove(&id).await?;
                self.emit(&removed, || {
                    if removed { format!("Removed {id}") } else { format!("{id} was not wishlisted") }
                })
            }
            WishlistCommand::List => {
                let all = self.market.listings.all().await;
                let items = self.market.wishlist.items(&all).await;
                self.emit(&items, || listing_table(&items))
            }
        }
    }

    async fn report(&self, command: ReportCommand) -> anyhow::Result<()> {
        match command {
            ReportCommand::Submit { listing_id, reason, details } => {
                let report = self.market.reports.submit(&listing_id, &reason, details).await?;
                self.emit(&report, || format!("Report {} recorded", report.id))
            }
            ReportCommand::List { listing } => {
                let reports = match listing {
                    Some(id) => self.market.reports.for_listing(&id).await,
                    None => self.market.reports.list().await,
                };
                self.emit(&reports, || report_table(&reports))
            }
        }
    }

    async fn search(&self, command: SearchCommand) -> anyhow::Result<()> {
        let searches = &self.market.searches;
        match command {
            SearchCommand::Save { filter, name } => {
                let saved = searches.save(&filter.to_filter()?, name.as_deref()).await?;
                self.emit(&saved, || format!("Saved \"{}\" ({})", saved.name, saved.id))
            }
            SearchCommand::List => {
                let all = self.market.listings.all().await;
                let views: Vec<SearchView> = searches
                    .match_counts(&all)
                    .await
                    .into_iter()
                    .map(|(search, matches)| SearchView { search, matches })
                    .collect();
                self.emit(&views, || {
                    if views.is_empty() {
                        return "No saved searches".to_string();
                    }
                    views
                        .iter()
                        .map(|v| {
                            let alerts = if v.search.notifications_enabled { "on" } else { "off" };
                            format!("{}  {}  {} matches  alerts {alerts}", v.search.id, v.search.name, v.matches)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
            }
            SearchCommand::Delete { id } => {
                searches.delete(&id).await?;
                self.emit(&id, || format!("Deleted {id}"))
            }
            SearchCommand::Toggle { id } => {
                let search = searches.toggle_notifications(&id).await?;
                self.emit(&search, || {
                    let state = if search.notifications_enabled { "on" } else { "off" };
                    format!("Alerts for \"{}\" are {state}", search.name)
                })
            }
            SearchCommand::Check => {
                let all = self.market.listings.all().await;
                let found = searches.check_new_matches(&all).await;
                self.emit(&found, || {
                    if found.is_empty() {
                        return "No new matches".to_string();
                    }
                    found
                        .iter()
                        .map(|m| {
                            format!(
                                "{}: {} new\n{}",
                                m.search.name,
                                m.new_listings.len(),
                                listing_table(&m.new_listings)
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
            }
        }
    }

    async fn offer(&self, args: OfferArgs) -> anyhow::Result<()> {
        let listing = self.market.listings.get(&args.listing_id).await?;
        let mut offer = OfferMessage::new(&listing);
        if let Some(price) = args.price {
            anyhow::ensure!(price.is_finite() && price >= 0.0, "offer price must be a non-negative number");
            offer.offer_price = price;
        }
        offer.buyer_name = args.name.unwrap_or_default();
        offer.buyer_contact = args.contact.unwrap_or_default();
        offer.message = args.message.unwrap_or_default();

        let view = OfferView {
            message: offer.render(),
            whatsapp: offer.whatsapp_link(),
            mailto: offer.mailto_link(),
        };
        self.emit(&view, || {
            let mut out = view.message.clone();
            for link in [&view.whatsapp, &view.mailto].into_iter().flatten() {
                out.push_str("\n\n");
                out.push_str(link);
            }
            out
        })
    }

    async fn admin(&self, passphrase: &str, command: AdminCommand) -> anyhow::Result<()> {
        let admin = self.market.admin.unlock(passphrase).await?;
        match command {
            AdminCommand::Export { kind, out } => {
                let document = admin.export(kind).await?;
                match out {
                    Some(path) => {
                        tokio::fs::write(&path, &document)
                            .await
                            .with_context(|| format!("writing {}", path.display()))?;
                        eprintln!("Exported {} to {}", kind.key(), path.display());
                    }
                    None => {
                        let mut stdout = tokio::io::stdout();
                        stdout.write_all(&document).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;
                    }
                }
                Ok(())
            }
            AdminCommand::Import { kind, file } => {
                let document = tokio::fs::read(&file)
                    .await
                    .with_context(|| format!("reading {}", file.display()))?;
                let count = admin.import(kind, &document).await?;
                self.emit(&count, || format!("Imported {count} records into {}", kind.key()))
            }
            AdminCommand::Clear { yes } => {
                anyhow::ensure!(yes, "refusing to clear all data without --yes");
                admin.clear_all().await?;
                self.emit(&true, || "All listings, wishlist, reports and session records cleared".to_string())
            }
            AdminCommand::Reports => {
                let reports: Vec<Report> = admin.reports().await;
                self.emit(&reports, || report_table(&reports))
            }
        }
    }

    fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

async fn read_files(paths: &[PathBuf]) -> anyhow::Result<Vec<Bytes>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        files.push(Bytes::from(data));
    }
    Ok(files)
}

fn listing_line(l: &Listing) -> String {
    let course = if l.course_code.is_empty() {
        String::new()
    } else {
        format!(" [{}]", l.course_code)
    };
    format!(
        "{}  {:<9}  ৳{:<7}  {}{}  ({}, {}, {})",
        l.id,
        l.status.to_string(),
        l.price,
        l.title,
        course,
        l.department,
        l.tag,
        l.condition
    )
}

fn listing_table(listings: &[Listing]) -> String {
    if listings.is_empty() {
        return "No listings found".to_string();
    }
    listings.iter().map(listing_line).collect::<Vec<_>>().join("\n")
}

fn listing_detail(view: &ListingView<'_>) -> String {
    let l = view.listing;
    let mut lines = vec![
        l.title.clone(),
        format!("{} · {} · {}", l.tag, l.condition, l.status),
        format!(
            "Price: ৳{}{}",
            l.price,
            if l.negotiable { " (negotiable)" } else { "" }
        ),
        format!("Department: {}", l.department),
    ];
    if !l.course_code.is_empty() {
        lines.push(format!("Course: {}", l.course_code));
    }
    if let Some(hint) = &l.location_hint {
        lines.push(format!("Meet at: {hint}"));
    }
    if !l.description.is_empty() {
        lines.push(String::new());
        lines.push(l.description.clone());
    }
    lines.push(String::new());
    lines.push(format!("Seller: {} ({})", l.seller_name, l.seller_contact));
    lines.push(seller_summary(&l.seller_name, &view.seller));
    if view.wishlisted {
        lines.push("In your wishlist".to_string());
    }
    if view.editable {
        lines.push("Posted in this session".to_string());
    }
    if view.reports > 0 {
        lines.push(format!("Reported {} time(s)", view.reports));
    }
    lines.join("\n")
}

fn seller_summary(name: &str, stats: &SellerStats) -> String {
    let since = stats
        .member_since
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{name}: {} · {} listings, {} sold, {} available · avg ৳{} · since {since} · {}",
        stats.trust.label(),
        stats.total_listings,
        stats.sold_count,
        stats.available_count,
        stats.avg_price,
        stats.departments.join(", ")
    )
}

fn report_table(reports: &[Report]) -> String {
    if reports.is_empty() {
        return "No reports".to_string();
    }
    reports
        .iter()
        .map(|r| {
            let details = r.details.as_deref().map(|d| format!(": {d}")).unwrap_or_default();
            format!("{}  {}  {}{details}", r.created_at.format("%Y-%m-%d %H:%M"), r.listing_id, r.reason)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
