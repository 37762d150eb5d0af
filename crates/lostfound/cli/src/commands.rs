//! Registry commands

use crate::error::{CliError, CliResult};
use crate::output::{self, print_success, OutputFormat};
use chrono::{DateTime, Utc};
use clap::{Subcommand, ValueEnum};
use lostfound_registry::{
    RegisterUserRequest, RegistryFacade, ReportFoundItemRequest, ReportLostItemRequest,
};
use lostfound_types::{
    FoundItem, FoundItemId, Identity, ItemFilter, ItemListing, ItemQuery, LostItem, LostItemId,
    SettlementReceipt, User,
};
use serde::Serialize;
use tabled::Tabled;

/// Registry subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Register the acting identity as a user
    Register {
        /// Display name (at least 3 characters)
        #[arg(long)]
        username: String,

        /// Contact email
        #[arg(long)]
        email: String,

        /// Ten-digit phone number
        #[arg(long)]
        phone: String,
    },

    /// Report a lost item, optionally pledging a reward
    ReportLost {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Where the item was lost
        #[arg(long)]
        location: String,

        /// Reward in ETH (e.g. 0.01), held in escrow until resolved
        #[arg(long)]
        reward: Option<String>,
    },

    /// Report a found item
    ReportFound {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Where the item was found
        #[arg(long)]
        location: String,
    },

    /// Resolve one of your lost-item reports and release its reward
    Resolve {
        /// Lost item ID
        id: u64,
    },

    /// Claim a found item
    Claim {
        /// Found item ID
        id: u64,
    },

    /// Show a single item
    Get {
        #[command(subcommand)]
        target: GetTarget,
    },

    /// Show lost and found item counts
    Count,

    /// List items
    List {
        /// Which reports to include
        #[arg(short, long, value_enum, default_value = "all")]
        filter: FilterArg,

        /// Case-insensitive text matched against name, description, and location
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a registered user (defaults to the acting identity)
    User {
        identity: Option<String>,
    },

    /// List settlement receipts
    Receipts,
}

#[derive(Subcommand)]
pub enum GetTarget {
    /// Lost item by ID
    Lost { id: u64 },
    /// Found item by ID
    Found { id: u64 },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FilterArg {
    All,
    Lost,
    Found,
}

impl From<FilterArg> for ItemFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => ItemFilter::All,
            FilterArg::Lost => ItemFilter::Lost,
            FilterArg::Found => ItemFilter::Found,
        }
    }
}

/// Table row for listings
#[derive(Debug, Serialize, Tabled)]
struct ItemRow {
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "LOCATION")]
    location: String,
    #[tabled(rename = "REPORTED BY")]
    reported_by: String,
    #[tabled(rename = "REWARD")]
    reward: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

impl From<&ItemListing> for ItemRow {
    fn from(listing: &ItemListing) -> Self {
        let (location, reward, status) = match listing {
            ItemListing::Lost(item) => (
                item.location.clone(),
                if item.reward.is_zero() {
                    "-".into()
                } else {
                    item.reward.to_string()
                },
                if item.is_open() { "open" } else { "resolved" }.into(),
            ),
            ItemListing::Found(item) => (
                item.location.clone(),
                "-".into(),
                match &item.claimant {
                    Some(claimant) => format!("claimed by {}", claimant),
                    None => "open".into(),
                },
            ),
        };
        Self {
            kind: listing.kind().to_string(),
            id: listing.id(),
            name: listing.name().to_string(),
            location,
            reported_by: listing.reported_by().to_string(),
            reward,
            status,
        }
    }
}

fn lost_row(item: &LostItem) -> ItemRow {
    ItemRow::from(&ItemListing::Lost(item.clone()))
}

fn found_row(item: &FoundItem) -> ItemRow {
    ItemRow::from(&ItemListing::Found(item.clone()))
}

/// Table row for users
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    #[tabled(rename = "IDENTITY")]
    identity: String,
    #[tabled(rename = "USERNAME")]
    username: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "PHONE")]
    phone: String,
    #[tabled(rename = "REGISTERED")]
    registered: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            identity: user.identity.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            registered: format_time(&user.registered_at),
        }
    }
}

/// Table row for receipts
#[derive(Debug, Serialize, Tabled)]
struct ReceiptRow {
    #[tabled(rename = "RECEIPT")]
    receipt: String,
    #[tabled(rename = "ACTION")]
    action: String,
    #[tabled(rename = "ITEM")]
    item: u64,
    #[tabled(rename = "ACTOR")]
    actor: String,
    #[tabled(rename = "PAYOUT")]
    payout: String,
    #[tabled(rename = "AT")]
    at: String,
}

impl From<&SettlementReceipt> for ReceiptRow {
    fn from(receipt: &SettlementReceipt) -> Self {
        Self {
            receipt: receipt.receipt_id.chars().take(8).collect(),
            action: receipt.action.to_string(),
            item: receipt.item_id,
            actor: receipt.actor.to_string(),
            payout: receipt
                .payout
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".into()),
            at: format_time(&receipt.timestamp),
        }
    }
}

#[derive(Serialize)]
struct Counts {
    lost: u64,
    found: u64,
}

#[derive(Serialize)]
struct Reported {
    kind: &'static str,
    id: u64,
}

fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn require_identity(caller: Option<&Identity>) -> CliResult<&Identity> {
    caller.ok_or_else(|| {
        CliError::InvalidInput(
            "no identity given: pass --as or set LOSTFOUND_IDENTITY".into(),
        )
    })
}

/// Execute a registry command
pub fn execute(
    command: Commands,
    registry: &RegistryFacade,
    caller: Option<&Identity>,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        Commands::Register {
            username,
            email,
            phone,
        } => {
            let caller = require_identity(caller)?;
            let user = registry.register_user(
                caller,
                RegisterUserRequest {
                    username,
                    email,
                    phone,
                },
            )?;
            if format == OutputFormat::Table {
                print_success(&format!("Registered {} as {}", user.identity, user.username));
                Ok(())
            } else {
                output::print_structured(&user, format)
            }
        }

        Commands::ReportLost {
            name,
            description,
            location,
            reward,
        } => {
            let caller = require_identity(caller)?;
            let id = registry.report_lost_item(
                caller,
                ReportLostItemRequest {
                    name,
                    description,
                    location,
                    reward,
                },
            )?;
            if format == OutputFormat::Table {
                let mut message = format!("Reported lost item #{}", id);
                if let Some(entry) = registry.escrow(id) {
                    message.push_str(&format!(" ({} held in escrow)", entry.held));
                }
                print_success(&message);
                Ok(())
            } else {
                output::print_structured(&Reported { kind: "lost", id: id.get() }, format)
            }
        }

        Commands::ReportFound {
            name,
            description,
            location,
        } => {
            let caller = require_identity(caller)?;
            let id = registry.report_found_item(
                caller,
                ReportFoundItemRequest {
                    name,
                    description,
                    location,
                },
            )?;
            if format == OutputFormat::Table {
                print_success(&format!("Reported found item #{}", id));
                Ok(())
            } else {
                output::print_structured(&Reported { kind: "found", id: id.get() }, format)
            }
        }

        Commands::Resolve { id } => {
            let caller = require_identity(caller)?;
            let receipt = registry.resolve_lost_item(caller, LostItemId::new(id))?;
            if format == OutputFormat::Table {
                let mut message = format!("Resolved lost item #{}", id);
                if let Some(payout) = receipt.payout {
                    message.push_str(&format!("; released {} to {}", payout, receipt.actor));
                }
                print_success(&message);
                Ok(())
            } else {
                output::print_structured(&receipt, format)
            }
        }

        Commands::Claim { id } => {
            let caller = require_identity(caller)?;
            let receipt = registry.claim_item(caller, FoundItemId::new(id))?;
            if format == OutputFormat::Table {
                print_success(&format!("Claimed found item #{}", id));
                Ok(())
            } else {
                output::print_structured(&receipt, format)
            }
        }

        Commands::Get { target } => match target {
            GetTarget::Lost { id } => {
                let item = registry
                    .get_lost_item(LostItemId::new(id))
                    .ok_or_else(|| CliError::NotFound(format!("lost item {}", id)))?;
                output::print_rows(vec![lost_row(&item)], &item, format)
            }
            GetTarget::Found { id } => {
                let item = registry
                    .get_found_item(FoundItemId::new(id))
                    .ok_or_else(|| CliError::NotFound(format!("found item {}", id)))?;
                output::print_rows(vec![found_row(&item)], &item, format)
            }
        },

        Commands::Count => {
            let counts = Counts {
                lost: registry.lost_item_count(),
                found: registry.found_item_count(),
            };
            if format == OutputFormat::Table {
                println!("Lost items:  {}", counts.lost);
                println!("Found items: {}", counts.found);
                Ok(())
            } else {
                output::print_structured(&counts, format)
            }
        }

        Commands::List { filter, search } => {
            let mut query = ItemQuery::new().with_filter(filter.into());
            if let Some(search) = search {
                query = query.with_search(search);
            }
            let listings = registry.list_items(&query);
            let rows: Vec<ItemRow> = listings.iter().map(ItemRow::from).collect();
            output::print_rows(rows, &listings, format)
        }

        Commands::User { identity } => {
            let identity = match identity {
                Some(raw) => Identity::parse(&raw)?,
                None => require_identity(caller)?.clone(),
            };
            let user = registry
                .get_user(&identity)
                .ok_or_else(|| CliError::NotFound(format!("user {}", identity)))?;
            output::print_rows(vec![UserRow::from(&user)], &user, format)
        }

        Commands::Receipts => {
            let receipts = registry.receipts();
            let rows: Vec<ReceiptRow> = receipts.iter().map(ReceiptRow::from).collect();
            output::print_rows(rows, &receipts, format)
        }
    }
}
