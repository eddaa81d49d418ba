//! Command-line interface
//!
//! The command tree is declared here with clap's derive API; each command is
//! executed by a function in [`handlers`].

pub mod handlers;
pub mod output;

use clap::{Parser, Subcommand};

pub use output::OutputFormatter;

/// Support desk with optional external helpdesk mirroring
#[derive(Parser, Debug)]
#[command(name = "etdesk", author, version, about, long_about = None)]
pub struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run as if started in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the desk in the current directory
    Init {
        /// Prefix of display numbers
        #[arg(long, default_value = "ET")]
        prefix: String,

        /// Rewrite the config file of an existing desk
        #[arg(short, long)]
        force: bool,
    },

    /// Manage ticket categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Open a new ticket
    New {
        /// One-line summary
        subject: String,

        #[arg(short, long)]
        description: String,

        /// Requester id
        #[arg(short, long)]
        requester: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// low, medium, high or urgent; defaults to the category's priority
        #[arg(short, long)]
        priority: Option<String>,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,

        #[arg(short, long)]
        assignee: Option<String>,

        /// web, email, phone, api or remote
        #[arg(long, default_value = "web")]
        channel: String,

        /// Custom field as key=value; the value is parsed as JSON when possible
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,

        /// Create the helpdesk mirror right away
        #[arg(long)]
        push: bool,
    },

    /// List tickets
    List {
        /// Only tickets with this status
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show a ticket with its history and comments
    Show {
        /// UUID, display number or external id
        ticket: String,
    },

    /// Change subject, description, priority, tags or assignee
    Edit {
        ticket: String,

        #[arg(long)]
        subject: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        /// Comma-separated tags replacing the current ones
        #[arg(short, long)]
        tags: Option<String>,

        #[arg(short, long)]
        assignee: Option<String>,

        /// Send changed fields to the helpdesk
        #[arg(long)]
        push: bool,
    },

    /// Move a ticket to another status
    Status {
        ticket: String,

        /// open, in_progress, pending_customer, resolved or closed
        status: String,

        /// Who is making the change
        #[arg(long, default_value = "staff")]
        actor: String,

        #[arg(short, long)]
        note: Option<String>,

        /// Send the new status to the helpdesk
        #[arg(long)]
        push: bool,
    },

    /// Add a comment to a ticket
    Comment {
        ticket: String,

        body: String,

        #[arg(long, default_value = "staff")]
        author: String,

        /// The author is the requester rather than staff
        #[arg(long)]
        from_requester: bool,

        /// Visible to staff only
        #[arg(long)]
        internal: bool,

        /// Mirror the comment as a helpdesk note
        #[arg(long)]
        push: bool,
    },

    /// Create the helpdesk mirror of a ticket
    Push { ticket: String },

    /// Pull one ticket and its comments from the helpdesk
    Pull { ticket: String },

    /// Pull every linked ticket that is not closed
    Sync,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Add or replace a category
    Add {
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Priority given to new tickets
        #[arg(short, long, default_value = "medium")]
        priority: String,

        /// Comma-separated tags added to new tickets
        #[arg(short, long)]
        tags: Option<String>,

        /// Assignee given to new tickets
        #[arg(long)]
        assign_to: Option<String>,

        #[arg(long, default_value_t = 24)]
        response_hours: u32,

        #[arg(long, default_value_t = 72)]
        resolution_hours: u32,

        /// Make this the default category
        #[arg(long)]
        default: bool,

        /// Keep the category but refuse new tickets in it
        #[arg(long)]
        inactive: bool,
    },

    /// List categories
    List {
        /// Include inactive categories
        #[arg(short, long)]
        all: bool,
    },

    /// Make a category the default
    Default { name: String },
}

/// Split a comma-separated option into trimmed, non-empty values
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
