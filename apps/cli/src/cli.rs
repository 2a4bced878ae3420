use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use boracrm_core::deals::{DealEdit, DealStage};

/// Bora CRM: contacts, deal pipeline and sales assistant.
#[derive(Debug, Parser)]
#[command(name = "bora-crm", version)]
pub struct Cli {
    /// Override the data directory (default: $BORA_CRM_DATA_DIR or ./data).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage contacts.
    #[command(subcommand)]
    Contacts(ContactsCommand),

    /// Manage deals.
    #[command(subcommand)]
    Deals(DealsCommand),

    /// Show the pipeline board, one column per stage.
    Board,

    /// Show pipeline totals.
    Summary,

    /// Draft an email to a contact with the sales assistant.
    DraftEmail(DraftEmailArgs),

    /// Assess a deal's health with the sales assistant.
    Analyze(AnalyzeArgs),

    /// Show which backends are in use.
    Status,
}

#[derive(Debug, Subcommand)]
pub enum ContactsCommand {
    /// List contacts, optionally filtered by name or company.
    List {
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Add a contact.
    Add(AddContactArgs),
    /// Remove a contact by id.
    Remove { id: String },
}

#[derive(Debug, Args)]
pub struct AddContactArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum DealsCommand {
    /// List deals with their contact.
    List,
    /// Add a deal.
    Add(AddDealArgs),
    /// Change a deal's title, value, stage, company or probability.
    Edit(EditDealArgs),
    /// Move a deal to another stage, e.g. `deals move d2 "closed won"`.
    Move { id: String, stage: DealStage },
    /// Remove a deal by id.
    Remove { id: String },
}

#[derive(Debug, Args)]
pub struct AddDealArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub value: Decimal,
    #[arg(long)]
    pub stage: Option<DealStage>,
    /// Id of the contact this deal belongs to.
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub probability: Option<u8>,
    /// Expected close date (YYYY-MM-DD).
    #[arg(long)]
    pub close_date: Option<NaiveDate>,
    /// Repeat for several tags.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Debug, Args)]
pub struct EditDealArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub value: Option<Decimal>,
    #[arg(long)]
    pub stage: Option<DealStage>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub probability: Option<u8>,
}

impl EditDealArgs {
    pub fn to_edit(&self) -> DealEdit {
        DealEdit {
            title: self.title.clone(),
            value: self.value,
            stage: self.stage,
            company_name: self.company.clone(),
            probability: self.probability,
        }
    }
}

#[derive(Debug, Args)]
pub struct DraftEmailArgs {
    /// Contact id.
    #[arg(long)]
    pub contact: String,
    /// Deal id giving context to the email.
    #[arg(long)]
    pub deal: Option<String>,
    /// What the email should achieve.
    #[arg(long)]
    pub intent: String,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Deal id.
    #[arg(long)]
    pub deal: String,
    /// Recent notes or interaction history.
    #[arg(long, default_value = "")]
    pub notes: String,
}
