//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod auth;
mod browse;
mod download;
mod relay;
mod search;
mod stats;
mod views;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "docusync")]
#[command(about = "Document platform client: search, bulk download and folder sync")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and save the session
    Login {
        /// Platform URL (defaults to platform_url from config)
        #[arg(long)]
        url: Option<String>,
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "DOCUSYNC_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Show the saved session
    Whoami,

    /// List file cabinets
    Cabinets,

    /// List a cabinet's fields
    Fields {
        cabinet: String,
        /// Include system fields
        #[arg(long)]
        all: bool,
    },

    /// List a cabinet's dialogs
    Dialogs { cabinet: String },

    /// Count documents in a cabinet
    Count { cabinet: String },

    /// Distinct values of a field
    SelectList { cabinet: String, field: String },

    /// Search a cabinet and show the results as a table
    Search {
        /// Cabinet ID (defaults to the last cabinet used)
        cabinet: Option<String>,
        /// Server-side condition FIELD=VALUE (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
        /// Column filter COLUMN=VALUE applied to the results (repeatable)
        #[arg(short, long = "where")]
        wheres: Vec<String>,
        /// Sort column
        #[arg(short, long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        #[arg(short, long, default_value = "1")]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
        /// Comma-separated columns to show
        #[arg(long)]
        columns: Option<String>,
        /// Write all filtered rows to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Apply a saved view
        #[arg(long)]
        view: Option<String>,
        /// Output format (table, json, ids)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Download documents into round-trip filenames
    Download {
        cabinet: String,
        /// Destination directory
        dest: PathBuf,
        /// Document IDs (defaults to every search result)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        /// Server-side condition FIELD=VALUE (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// Watch a folder and upload edited documents back
    Watch {
        dir: PathBuf,
        /// Field to set after each upload
        #[arg(long, requires = "update_value")]
        update_field: Option<String>,
        #[arg(long, requires = "update_field")]
        update_value: Option<String>,
        /// Seconds between scans
        #[arg(long)]
        interval: Option<u64>,
        /// Seconds without work before stopping
        #[arg(long)]
        idle: Option<u64>,
    },

    /// Run the local forwarding relay
    Relay {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage saved views
    Views {
        #[command(subcommand)]
        command: ViewCommands,
    },

    /// Show how a field's values are distributed across a cabinet
    Stats {
        cabinet: String,
        field: String,
        /// Documents per request
        #[arg(long, default_value = "500")]
        batch: usize,
    },
}

#[derive(Subcommand)]
enum ViewCommands {
    /// List saved views
    List,
    /// Show a saved view
    Show { id: String },
    /// Delete a saved view
    Delete { id: String },
    /// Create or update a saved view
    Save {
        /// Existing view ID to replace
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        cabinet: String,
        /// Condition FIELD=VALUE (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
        /// Comma-separated visible columns
        #[arg(long)]
        columns: Option<String>,
        /// Field whose value drives the status column
        #[arg(long)]
        status_field: Option<String>,
        /// Status rule VALUE=COLOR (repeatable)
        #[arg(long = "rule")]
        rules: Vec<String>,
    },
    /// Set a document's manual status in a view (approved, pending, rejected, none)
    Mark {
        view: String,
        document: String,
        status: String,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Login {
            url,
            username,
            password,
        } => auth::cmd_login(&settings, url, &username, password).await,
        Commands::Logout => auth::cmd_logout(&settings).await,
        Commands::Whoami => auth::cmd_whoami(&settings).await,
        Commands::Cabinets => browse::cmd_cabinets(&settings).await,
        Commands::Fields { cabinet, all } => browse::cmd_fields(&settings, &cabinet, all).await,
        Commands::Dialogs { cabinet } => browse::cmd_dialogs(&settings, &cabinet).await,
        Commands::Count { cabinet } => browse::cmd_count(&settings, &cabinet).await,
        Commands::SelectList { cabinet, field } => {
            browse::cmd_select_list(&settings, &cabinet, &field).await
        }
        Commands::Search {
            cabinet,
            filters,
            wheres,
            sort,
            desc,
            page,
            page_size,
            columns,
            csv,
            view,
            format,
        } => {
            search::cmd_search(
                &settings,
                search::SearchArgs {
                    cabinet,
                    filters,
                    wheres,
                    sort,
                    desc,
                    page,
                    page_size,
                    columns,
                    csv,
                    view,
                    format,
                },
            )
            .await
        }
        Commands::Download {
            cabinet,
            dest,
            ids,
            filters,
        } => download::cmd_download(&settings, &cabinet, &dest, &ids, &filters).await,
        Commands::Watch {
            dir,
            update_field,
            update_value,
            interval,
            idle,
        } => {
            watch::cmd_watch(&settings, &dir, update_field.zip(update_value), interval, idle).await
        }
        Commands::Relay { host, port } => relay::cmd_relay(&settings, host, port).await,
        Commands::Views { command } => match command {
            ViewCommands::List => views::cmd_views_list(&settings).await,
            ViewCommands::Show { id } => views::cmd_views_show(&settings, &id).await,
            ViewCommands::Delete { id } => views::cmd_views_delete(&settings, &id).await,
            ViewCommands::Save {
                id,
                name,
                cabinet,
                filters,
                columns,
                status_field,
                rules,
            } => {
                views::cmd_views_save(
                    &settings,
                    views::SaveArgs {
                        id,
                        name,
                        cabinet,
                        filters,
                        columns,
                        status_field,
                        rules,
                    },
                )
                .await
            }
            ViewCommands::Mark {
                view,
                document,
                status,
            } => views::cmd_views_mark(&settings, &view, &document, &status).await,
        },
        Commands::Stats {
            cabinet,
            field,
            batch,
        } => stats::cmd_stats(&settings, &cabinet, &field, batch).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "docusync", "search", "cab-1", "-f", "STATUS=Open", "--where", "DOCTYPE=Invoice",
            "--sort", "AMOUNT", "--desc", "--page", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                cabinet,
                filters,
                wheres,
                sort,
                desc,
                page,
                ..
            } => {
                assert_eq!(cabinet.as_deref(), Some("cab-1"));
                assert_eq!(filters, vec!["STATUS=Open"]);
                assert_eq!(wheres, vec!["DOCTYPE=Invoice"]);
                assert_eq!(sort.as_deref(), Some("AMOUNT"));
                assert!(desc);
                assert_eq!(page, 2);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_watch_update_pair_required() {
        assert!(Cli::try_parse_from(["docusync", "watch", "/tmp/x", "--update-field", "STATUS"]).is_err());
        assert!(Cli::try_parse_from([
            "docusync", "watch", "/tmp/x", "--update-field", "STATUS", "--update-value", "Done"
        ])
        .is_ok());
    }
}
