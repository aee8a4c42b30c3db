//! mailctl - Operator tool for mailbox ownership records
//!
//! Runs the mailbox query layer against the configured store and prints
//! results as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::PathBuf;

use mailbox::{
    CONFIG_FILE, EmailUserId, EmailUserRepository, FolderId, FolderType, MailboxConfig,
    MassActionHandler, MassActionRequest, OrganizationId, SeenFilter, UserId, count_unseen,
    format_badge, parse_id_list,
};

#[derive(Parser)]
#[command(name = "mailctl")]
#[command(about = "Inspect and update mailbox ownership records")]
struct Cli {
    /// Config file to use instead of mailbox.json in the config directory
    #[arg(short, long, env = "MAILCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count unseen emails of a user and show the menu badge
    Unseen {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        organization: i64,
    },

    /// List a user's emails in folders of active origins
    List {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        organization: i64,
        /// Restrict to these folder types (inbox, sent, drafts, trash, spam, other)
        #[arg(long = "folder-type", value_name = "TYPE")]
        folder_types: Vec<String>,
        #[arg(long, conflicts_with = "unseen")]
        seen: bool,
        #[arg(long)]
        unseen: bool,
    },

    /// Set the seen flag on association ids
    SetSeen {
        /// Comma separated email_user ids
        #[arg(long)]
        ids: String,
        /// Mark as unseen instead of seen
        #[arg(long)]
        unseen: bool,
    },

    /// Mark threads read or unread the way the grid mass action does
    MarkThreads {
        #[arg(long)]
        user: i64,
        /// Comma separated email_user ids from the grid
        #[arg(long, default_value = "")]
        values: String,
        /// Treat `values` as rows excluded from "select all"
        #[arg(long)]
        all_except: bool,
        #[arg(long = "folder-type")]
        folder_type: Option<String>,
        #[arg(long)]
        unread: bool,
    },

    /// Ids in a folder that are not in the given list
    Inverted {
        #[arg(long)]
        folder: i64,
        /// Comma separated email_user ids to leave out
        #[arg(long, default_value = "")]
        ids: String,
    },
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Bootstrap config directory
    if let Err(e) = config::init() {
        warn!("Failed to initialize config directory: {}", e);
    }

    let settings = match &cli.config {
        Some(path) => MailboxConfig::from_file(path)?,
        None => {
            if !config::config_exists(CONFIG_FILE) {
                // Leave an editable copy of the defaults on first run
                match config::save_json(CONFIG_FILE, &MailboxConfig::default()) {
                    Ok(()) => info!("Wrote default {}", CONFIG_FILE),
                    Err(e) => warn!("Failed to write default {}: {}", CONFIG_FILE, e),
                }
            }
            MailboxConfig::load()?
        }
    };
    let repository = EmailUserRepository::new(settings.open_store()?);

    let output = match cli.command {
        Commands::Unseen { user, organization } => {
            let count = count_unseen(&repository, UserId(user), OrganizationId(organization))?;
            serde_json::json!({
                "count": count,
                "badge": format_badge(count, settings.badge_cap),
            })
        }
        Commands::List {
            user,
            organization,
            folder_types,
            seen,
            unseen,
        } => {
            let folder_types = folder_types
                .iter()
                .map(|t| t.parse::<FolderType>())
                .collect::<Result<Vec<_>, _>>()?;
            let filter = match (seen, unseen) {
                (true, _) => SeenFilter::SeenOnly,
                (_, true) => SeenFilter::UnseenOnly,
                _ => SeenFilter::Any,
            };
            let rows = repository.get_email_user_list(
                UserId(user),
                OrganizationId(organization),
                &folder_types,
                filter,
            )?;
            serde_json::to_value(rows)?
        }
        Commands::SetSeen { ids, unseen } => {
            let ids: Vec<EmailUserId> = parse_id_list(&ids)?.into_iter().map(EmailUserId).collect();
            let updated = repository.set_email_users_seen(&ids, !unseen)?;
            serde_json::json!({ "updated": updated })
        }
        Commands::MarkThreads {
            user,
            values,
            all_except,
            folder_type,
            unread,
        } => {
            let request = MassActionRequest::from_grid(
                &values,
                !all_except,
                UserId(user),
                folder_type.as_deref(),
            )?;
            let handler = MassActionHandler::with_repository(repository);
            let result = handler.mark_seen(&request, !unread)?;
            serde_json::to_value(result)?
        }
        Commands::Inverted { folder, ids } => {
            let ids: Vec<EmailUserId> = parse_id_list(&ids)?.into_iter().map(EmailUserId).collect();
            let inverted = repository.get_inverted_ids_from_folder(&ids, FolderId(folder))?;
            serde_json::to_value(inverted)?
        }
    };

    let text = serde_json::to_string_pretty(&output).context("Failed to render output")?;
    println!("{}", text);
    info!("Done");
    Ok(())
}
