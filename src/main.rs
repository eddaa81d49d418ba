//! etdesk - support desk with optional external helpdesk mirroring
//!
//! Entry point of the CLI: parses arguments, sets up logging and dispatches
//! to the command handlers.

use clap::Parser;
use etdesk::cli::handlers::{
    EditParams, NewParams, handle_category_command, handle_comment_command, handle_edit_command,
    handle_init, handle_list_command, handle_new_command, handle_pull_command,
    handle_push_command, handle_show_command, handle_status_command, handle_sync_command,
};
use etdesk::cli::{Cli, Commands, OutputFormatter};
use etdesk::core::Requester;
use etdesk::error::{DeskError, Result};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, &formatter).await {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    init_logging(cli.verbose);

    if let Some(project_path) = &cli.project {
        std::env::set_current_dir(project_path)?;
    }

    dispatch_command(cli.command, formatter).await
}

/// `RUST_LOG` wins; otherwise warnings only, or everything from this crate
/// under `--verbose`
fn init_logging(verbose: bool) {
    let fallback = if verbose { "etdesk=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch_command(command: Commands, formatter: &OutputFormatter) -> Result<()> {
    match command {
        Commands::Init { prefix, force } => handle_init(&prefix, force, formatter),
        Commands::Category { command } => handle_category_command(command, formatter),
        Commands::New {
            subject,
            description,
            requester,
            email,
            name,
            phone,
            category,
            priority,
            tags,
            assignee,
            channel,
            fields,
            push,
        } => {
            let mut requester = Requester::new(requester);
            requester.email = email;
            requester.name = name;
            requester.phone = phone;
            handle_new_command(
                NewParams {
                    subject,
                    description,
                    requester,
                    category,
                    priority,
                    tags,
                    assignee,
                    channel,
                    fields,
                    push,
                },
                formatter,
            )
            .await
        },
        Commands::List { status } => handle_list_command(status.as_deref(), formatter),
        Commands::Show { ticket } => handle_show_command(&ticket, formatter),
        Commands::Edit {
            ticket,
            subject,
            description,
            priority,
            tags,
            assignee,
            push,
        } => {
            handle_edit_command(
                EditParams {
                    reference: ticket,
                    subject,
                    description,
                    priority,
                    tags,
                    assignee,
                    push,
                },
                formatter,
            )
            .await
        },
        Commands::Status {
            ticket,
            status,
            actor,
            note,
            push,
        } => handle_status_command(&ticket, &status, &actor, note, push, formatter).await,
        Commands::Comment {
            ticket,
            body,
            author,
            from_requester,
            internal,
            push,
        } => {
            handle_comment_command(
                &ticket,
                &body,
                &author,
                from_requester,
                internal,
                push,
                formatter,
            )
            .await
        },
        Commands::Push { ticket } => handle_push_command(&ticket, formatter).await,
        Commands::Pull { ticket } => handle_pull_command(&ticket, formatter).await,
        Commands::Sync => handle_sync_command(formatter).await,
    }
}

/// Print an error with suggestions, and as JSON when requested
fn handle_error(error: &DeskError, formatter: &OutputFormatter) {
    formatter.error(&error.user_message());

    let suggestions = error.suggestions();
    if !formatter.is_json() && !suggestions.is_empty() {
        eprintln!("\nSuggestions:");
        for suggestion in &suggestions {
            eprintln!("  • {suggestion}");
        }
    }

    if formatter.is_json() {
        let _ = formatter.print_json(&serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "suggestions": suggestions,
            "recoverable": error.is_recoverable(),
            "is_config_error": error.is_config_error(),
        }));
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}
