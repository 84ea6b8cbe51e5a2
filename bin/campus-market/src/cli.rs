//! Command-line interface definition for campus-market.

use clap::{Args, Parser, Subcommand};
use cm_core::filter::{ListingFilter, SortMode};
use cm_core::models::{Condition, Tag};
use cm_core::traits::Collection;
use std::path::PathBuf;

/// campus-market - buy and sell course books and class notes
#[derive(Parser, Debug)]
#[command(name = "campus-market")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// One line of `shell` input: a command without the global flags.
#[derive(Parser, Debug)]
#[command(name = "campus-market", no_binary_name = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse listings
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Ordering: recent, price-low, price-high or bumped
        #[arg(long, default_value = "recent")]
        sort: SortMode,

        /// Start from a saved search instead of the filter flags
        #[arg(long)]
        saved: Option<String>,
    },

    /// Show one listing with its seller profile
    Show { id: String },

    /// Post a new listing (editable for the rest of this session)
    Post(PostArgs),

    /// Mark a listing posted in this session as sold
    MarkSold { id: String },

    /// Mark a listing posted in this session as reserved
    MarkReserved { id: String },

    /// Move a listing posted in this session to the top of the bumped order
    Bump { id: String },

    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        command: WishlistCommand,
    },

    /// Report a listing or review reports
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Saved searches and new-match alerts
    Search {
        #[command(subcommand)]
        command: SearchCommand,
    },

    /// Seller profile for the seller of a listing
    Seller { listing_id: String },

    /// Compose an offer message to a seller
    Offer(OfferArgs),

    /// Encode images as listing thumbnails
    Thumbnail {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Passphrase-protected data management
    Admin {
        /// Admin passphrase
        #[arg(long, env = "CAMPUS_MARKET_ADMIN_PASSPHRASE", hide_env_values = true)]
        passphrase: String,

        #[command(subcommand)]
        command: AdminCommand,
    },

    /// Print the Argon2 hash to put in `admin.passphrase_hash`
    HashPassphrase { passphrase: String },

    /// Read commands from stdin, one per line, in a single session
    Shell,
}

/// Filter flags shared by `list` and `search save`.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Text matched against title, course code, seller and description
    #[arg(short, long)]
    pub search: Option<String>,

    /// Book, Classnotes or All
    #[arg(long)]
    pub tag: Option<String>,

    /// Department name, or All
    #[arg(long)]
    pub department: Option<String>,

    #[arg(long)]
    pub course: Option<String>,

    /// New-ish, Used or Rough; repeat for several
    #[arg(long = "condition")]
    pub conditions: Vec<Condition>,

    #[arg(long)]
    pub min_price: Option<f64>,

    #[arg(long)]
    pub max_price: Option<f64>,
}

impl FilterArgs {
    /// Typed filter; the word `All` for tag or department means no constraint.
    pub fn to_filter(&self) -> anyhow::Result<ListingFilter> {
        let tag = match self.tag.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(t) if t.eq_ignore_ascii_case("all") => None,
            Some(t) => Some(t.parse::<Tag>().map_err(anyhow::Error::msg)?),
        };
        let department = self
            .department
            .clone()
            .filter(|d| !d.trim().eq_ignore_ascii_case("all"));

        Ok(ListingFilter {
            search: self.search.clone(),
            tag,
            department,
            course_code: self.course.clone(),
            conditions: self.conditions.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
        })
    }
}

#[derive(Args, Debug)]
pub struct PostArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Book or Classnotes
    #[arg(long, default_value = "Book")]
    pub tag: String,

    #[arg(long)]
    pub department: String,

    #[arg(long, default_value = "")]
    pub course: String,

    /// New-ish, Used or Rough
    #[arg(long, default_value = "Used")]
    pub condition: Condition,

    #[arg(long)]
    pub price: f64,

    #[arg(long)]
    pub negotiable: bool,

    #[arg(long)]
    pub seller_name: String,

    /// Phone number or email address
    #[arg(long)]
    pub seller_contact: String,

    /// Where to meet, e.g. "Library gate"
    #[arg(long)]
    pub location: Option<String>,

    /// Image files; the first six are kept
    #[arg(long = "image")]
    pub images: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct OfferArgs {
    pub listing_id: String,

    /// Offered price; defaults to 90% of the asking price
    #[arg(long)]
    pub price: Option<f64>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub contact: Option<String>,

    #[arg(long)]
    pub message: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum WishlistCommand {
    Add { id: String },
    Remove { id: String },
    List,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    Submit {
        listing_id: String,

        #[arg(long)]
        reason: String,

        #[arg(long)]
        details: Option<String>,
    },
    List {
        /// Only reports about this listing
        #[arg(long)]
        listing: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SearchCommand {
    /// Save the given filters
    Save {
        #[command(flatten)]
        filter: FilterArgs,

        /// Display name; generated from the filters when omitted
        #[arg(long)]
        name: Option<String>,
    },
    /// Saved searches with their current match counts
    List,
    Delete { id: String },
    /// Turn new-match alerts on or off
    Toggle { id: String },
    /// Report listings that are new since the previous check
    Check,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Write a collection's document to a file or stdout
    Export {
        kind: Collection,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Replace a collection with the contents of a JSON file
    Import { kind: Collection, file: PathBuf },
    /// Remove listings, wishlist, reports and session records
    Clear {
        /// Required; there is no undo
        #[arg(long)]
        yes: bool,
    },
    /// List every submitted report
    Reports,
}
