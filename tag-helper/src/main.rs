//! Command-line driver for the tag-list store.
//!
//! Operates on the store selected by `TAG_HELPER_STORAGE_DIR` so lists can
//! be inspected and edited outside the browser.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;

use clap::{Parser, Subcommand};
use mention_format::MentionStyle;
use ortho_config::OrthoConfig;
use thiserror::Error;

use tag_helper::ExtensionContext;
use tag_helper::config::ExtensionSettings;
use tag_helper::domain::ports::KeyValueStoreError;
use tag_helper::domain::{
    Entity, LinkedInOrg, LinkedInUser, ListId, Notice, Placement, Settings, TagListError,
    render_mentions,
};
use tag_helper::telemetry::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "tag-helper", about = "Manage LinkedIn tag lists")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show every list; the selected one is starred.
    Lists,
    /// Create a list and select it.
    Create { name: String },
    /// Rename a list.
    Rename { id: String, name: String },
    /// Delete a list.
    Delete { id: String },
    /// Select a list.
    Select { id: String },
    /// Add a member profile to a list.
    AddUser {
        #[arg(long, default_value = "default")]
        list: String,
        #[arg(long)]
        member_id: String,
        #[arg(long)]
        urn: String,
        #[arg(long)]
        name: String,
    },
    /// Add a company page to a list.
    AddOrg {
        #[arg(long, default_value = "default")]
        list: String,
        #[arg(long)]
        company_id: String,
        #[arg(long)]
        universal_name: String,
        #[arg(long)]
        name: String,
    },
    /// Print the mention text for a list (the selected one by default).
    Mentions {
        #[arg(long)]
        list: Option<String>,
        /// Render `<strong>` markup as the post editor receives it.
        #[arg(long)]
        strong: bool,
    },
    /// Set the word limit applied to inserted names (0 keeps full names).
    WordLimit {
        limit: u32,
        /// Never shorten organisation names.
        #[arg(long)]
        keep_org_names: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Store(#[from] KeyValueStoreError),
    #[error(transparent)]
    Lists(#[from] TagListError),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = ExtensionSettings::load_from_iter([OsString::from("tag-helper")])
        .map_err(|err| CliError::Config(err.to_string()))?;
    init_tracing(settings.json_logs);

    let context = ExtensionContext::from_settings(&settings)?;
    let service = context.service();

    match cli.command {
        Command::Lists => {
            let root = service.snapshot().await?;
            for list in &root.lists {
                let marker = if list.id == root.selected_list_id { "*" } else { " " };
                println!("{marker} {} {} ({})", list.id, list.name, list.len());
            }
        }
        Command::Create { name } => {
            let id = service.create_list(&name).await?;
            println!("{id}");
        }
        Command::Rename { id, name } => service.rename_list(&ListId::new(id), &name).await?,
        Command::Delete { id } => service.delete_list(&ListId::new(id)).await?,
        Command::Select { id } => service.select_list(&ListId::new(id)).await?,
        Command::AddUser {
            list,
            member_id,
            urn,
            name,
        } => {
            let user = LinkedInUser {
                entity_urn: urn,
                member_id,
                display_name: name,
            };
            let outcome = service.add_entity(&ListId::new(list), Entity::User(user)).await?;
            report(&Notice::for_placement(Placement::Add, &outcome));
        }
        Command::AddOrg {
            list,
            company_id,
            universal_name,
            name,
        } => {
            let org = LinkedInOrg {
                company_id,
                universal_name,
                display_name: name,
            };
            let outcome = service.add_entity(&ListId::new(list), Entity::Org(org)).await?;
            report(&Notice::for_placement(Placement::Add, &outcome));
        }
        Command::Mentions { list, strong } => {
            let root = service.snapshot().await?;
            let id = list.map_or_else(|| root.selected_list_id.clone(), ListId::new);
            let style = if strong {
                MentionStyle::Strong
            } else {
                MentionStyle::PlainText
            };
            let entities = root.require_list(&id)?.entities();
            println!("{}", render_mentions(entities, &root.settings, style));
        }
        Command::WordLimit {
            limit,
            keep_org_names,
        } => {
            service
                .update_settings(Settings {
                    name_word_limit: limit,
                    truncate_org_names: !keep_org_names,
                })
                .await?;
        }
    }
    Ok(())
}

fn report(notice: &Notice) {
    println!("{}", notice.message);
}
