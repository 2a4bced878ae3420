mod cli;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, warn};
use serde::Serialize;

use boracrm_ai::AssistantService;
use boracrm_core::contacts::{resolve_contact, search_contacts, Contact, NewContact};
use boracrm_core::deals::{build_board, summarize, Deal, NewDeal};
use boracrm_core::optimistic::{MutationTicket, OptimisticCollection};
use boracrm_core::storage::{
    LocalStoreBackend, MemoryLocalStore, RemoteStoreTrait, StorageFacade, StorageMode,
};
use boracrm_core::AppConfig;
use boracrm_remote_store::RemoteStoreAdapter;
use boracrm_storage_sqlite::SqliteLocalStore;

use crate::cli::{Cli, Command, ContactsCommand, DealsCommand};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    debug!("Starting with {:?}", config);

    let facade = build_facade(&config, cli.ephemeral)?;
    let out = Output { json: cli.json };

    match cli.command {
        Command::Contacts(command) => run_contacts(command, facade, &out).await,
        Command::Deals(command) => run_deals(command, facade, &out).await,
        Command::Board => {
            let board = build_board(&facade.load_deals().await);
            out.emit(&board, |board| {
                for column in board {
                    println!(
                        "== {} ({} deals, R${})",
                        column.stage,
                        column.deals.len(),
                        column.total_value
                    );
                    for deal in &column.deals {
                        println!("   {:<8} {:<32} R${}", deal.id, deal.title, deal.value);
                    }
                }
            })
        }
        Command::Summary => {
            let summary = summarize(&facade.load_deals().await);
            out.emit(&summary, |s| {
                println!("Pipeline total: R${}", s.total_value);
                println!("Active deals:   {}", s.active_deals);
                println!("Average ticket: R${}", s.average_ticket.round_dp(2));
            })
        }
        Command::DraftEmail(args) => {
            let contacts = facade.load_contacts().await;
            let contact = find_contact(&contacts, &args.contact)?;
            let deals = facade.load_deals().await;
            let deal = match &args.deal {
                Some(id) => Some(find_deal(&deals, id)?),
                None => None,
            };
            let assistant = AssistantService::new(config.ai_api_key.clone())?;
            let draft = assistant
                .draft_email(contact, deal, &args.intent)
                .await
                .context("drafting email")?;
            out.emit(&draft, |d| println!("Subject: {}\n\n{}", d.subject, d.body))
        }
        Command::Analyze(args) => {
            let deals = facade.load_deals().await;
            let deal = find_deal(&deals, &args.deal)?;
            let contact = resolve_contact(&facade.load_contacts().await, deal.contact_id.as_deref());
            let assistant = AssistantService::new(config.ai_api_key.clone())?;
            let analysis = assistant
                .analyze_deal(deal, &contact, &args.notes)
                .await
                .context("analyzing deal")?;
            out.emit(&analysis, |a| {
                println!("Sentiment:  {:?}", a.sentiment);
                println!("Risk score: {}/100", a.risk_score);
                println!("Summary:    {}", a.summary);
                for (i, step) in a.next_steps.iter().enumerate() {
                    println!("  {}. {}", i + 1, step);
                }
            })
        }
        Command::Status => {
            let assistant = AssistantService::new(config.ai_api_key.clone())?;
            let status = Status {
                storage: facade.mode(),
                assistant: assistant.mode(),
                data_dir: config.data_dir.display().to_string(),
                ephemeral: cli.ephemeral,
            };
            out.emit(&status, |s| {
                println!("Storage:   {:?}", s.storage);
                println!("Assistant: {:?}", s.assistant);
                if s.ephemeral {
                    println!("Data dir:  (in memory)");
                } else {
                    println!("Data dir:  {}", s.data_dir);
                }
            })
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    storage: StorageMode,
    assistant: boracrm_ai::AssistantMode,
    data_dir: String,
    ephemeral: bool,
}

struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

fn build_facade(config: &AppConfig, ephemeral: bool) -> Result<Arc<StorageFacade>> {
    let local: Arc<dyn LocalStoreBackend> = if ephemeral {
        Arc::new(MemoryLocalStore::new())
    } else {
        let store = SqliteLocalStore::open(&config.data_dir).with_context(|| {
            format!("opening local store in {}", config.data_dir.display())
        })?;
        Arc::new(store)
    };
    let remote = RemoteStoreAdapter::from_config(config.remote.as_ref())
        .map(|adapter| Arc::new(adapter) as Arc<dyn RemoteStoreTrait>);
    Ok(Arc::new(StorageFacade::new(local, remote, config.storage)))
}

fn find_contact<'a>(contacts: &'a [Contact], id: &str) -> Result<&'a Contact> {
    match contacts.iter().find(|c| c.id == id) {
        Some(contact) => Ok(contact),
        None => bail!("No contact with id {}", id),
    }
}

fn find_deal<'a>(deals: &'a [Deal], id: &str) -> Result<&'a Deal> {
    match deals.iter().find(|d| d.id == id) {
        Some(deal) => Ok(deal),
        None => bail!("No deal with id {}", id),
    }
}

/// Waits for a queued change; the in-memory view already reflects it.
async fn settle(ticket: MutationTicket) -> Result<()> {
    let id = ticket.entity_id().to_string();
    if let Err(err) = ticket.persisted().await {
        warn!("Change to {} was rolled back", id);
        return Err(err.into());
    }
    Ok(())
}

async fn run_contacts(
    command: ContactsCommand,
    facade: Arc<StorageFacade>,
    out: &Output,
) -> Result<()> {
    match command {
        ContactsCommand::List { search } => {
            let contacts = facade.load_contacts().await;
            let shown: Vec<&Contact> = match search.as_deref() {
                Some(term) => search_contacts(&contacts, term),
                None => contacts.iter().collect(),
            };
            out.emit(&shown, |shown| {
                for c in shown {
                    println!(
                        "{:<16} {:<20} {:<24} {:<28} {}",
                        c.id, c.name, c.company, c.email, c.last_contacted
                    );
                }
            })
        }
        ContactsCommand::Add(args) => {
            let contacts = OptimisticCollection::<Contact>::load(facade).await;
            let ticket = contacts.add(NewContact {
                name: args.name,
                email: args.email,
                phone: args.phone,
                company: args.company,
                role: args.role,
                notes: args.notes,
            })?;
            let id = ticket.entity_id().to_string();
            settle(ticket).await?;
            let created = contacts.get(&id);
            out.emit(&created, |c| {
                if let Some(c) = c {
                    println!("Added contact {} ({})", c.id, c.name);
                }
            })
        }
        ContactsCommand::Remove { id } => {
            let contacts = OptimisticCollection::<Contact>::load(facade).await;
            settle(contacts.remove(&id)?).await?;
            out.emit(&id, |id| println!("Removed contact {}", id))
        }
    }
}

async fn run_deals(command: DealsCommand, facade: Arc<StorageFacade>, out: &Output) -> Result<()> {
    match command {
        DealsCommand::List => {
            let deals = facade.load_deals().await;
            let contacts = facade.load_contacts().await;
            out.emit(&deals, |deals| {
                for d in deals {
                    let contact = resolve_contact(&contacts, d.contact_id.as_deref());
                    println!(
                        "{:<16} {:<32} {:<12} R${:<12} {:>3}%  {}",
                        d.id, d.title, d.stage, d.value, d.probability, contact.name
                    );
                }
            })
        }
        DealsCommand::Add(args) => {
            let deals = OptimisticCollection::<Deal>::load(facade).await;
            let ticket = deals.add(NewDeal {
                title: args.title,
                value: args.value,
                stage: args.stage,
                contact_id: args.contact,
                company_name: args.company,
                probability: args.probability,
                expected_close_date: args.close_date,
                tags: (!args.tags.is_empty()).then_some(args.tags),
            })?;
            let id = ticket.entity_id().to_string();
            settle(ticket).await?;
            let created = deals.get(&id);
            out.emit(&created, |d| {
                if let Some(d) = d {
                    println!("Added deal {} ({}, {})", d.id, d.title, d.stage);
                }
            })
        }
        DealsCommand::Edit(args) => {
            let edit = args.to_edit();
            if edit.is_empty() {
                bail!("Nothing to change; pass at least one of --title, --value, --stage, --company, --probability");
            }
            let deals = OptimisticCollection::<Deal>::load(facade).await;
            settle(deals.edit(&args.id, &edit)?).await?;
            let edited = deals.get(&args.id);
            out.emit(&edited, |d| {
                if let Some(d) = d {
                    println!(
                        "Updated deal {} ({}, {}, R${})",
                        d.id, d.title, d.stage, d.value
                    );
                }
            })
        }
        DealsCommand::Move { id, stage } => {
            let deals = OptimisticCollection::<Deal>::load(facade).await;
            let previous = match deals.get(&id) {
                Some(deal) => deal.stage,
                None => bail!("No deal with id {}", id),
            };
            settle(deals.move_to_stage(&id, stage)?).await?;
            let moved = deals.get(&id);
            out.emit(&moved, |_| println!("Moved {} from {} to {}", id, previous, stage))
        }
        DealsCommand::Remove { id } => {
            let deals = OptimisticCollection::<Deal>::load(facade).await;
            settle(deals.remove(&id)?).await?;
            out.emit(&id, |id| println!("Removed deal {}", id))
        }
    }
}
