use clap::{Parser, Subcommand};

/// Command-line interface definition for rChecklist
/// Shared store checklists with time-windowed locking, backed by SQLite
#[derive(Parser)]
#[command(
    name = "rchecklist",
    version = env!("CARGO_PKG_VERSION"),
    about = "Store checklists shared across devices: fill in tasks, attach photos, finalize and review",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Act as this user instead of the configured one
    #[arg(global = true, long = "user")]
    pub user: Option<String>,

    /// Act with this role (staff or manager)
    #[arg(global = true, long = "role")]
    pub role: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Write missing fields to the configuration file")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Import or list checklist templates
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Show the checklist currently in effect
    Status {
        /// Template id or name
        template: String,
    },

    /// Mark a task as done (or not done with --off)
    Toggle {
        template: String,
        task: String,

        #[arg(long = "off", help = "Mark the task as not done")]
        off: bool,
    },

    /// Set the value of a task (an empty value clears it)
    Value {
        template: String,
        task: String,
        value: String,
    },

    /// Set the comment of a task (an empty comment clears it)
    Comment {
        template: String,
        task: String,
        text: String,
    },

    /// Attach a photo to a task
    Photo {
        template: String,
        task: String,

        #[arg(long = "file", value_name = "IMAGE", help = "Image file to attach")]
        file: String,
    },

    /// Submit the current draft for review
    Finalize {
        template: String,

        #[arg(long = "yes", short = 'y', help = "Submit even if some tasks are incomplete")]
        yes: bool,
    },

    /// Override a flagged photo audit (manager)
    Override { submission: String, task: String },

    /// Approve or reject a submitted checklist (manager)
    Review {
        submission: String,

        #[arg(long, conflicts_with = "reject", required_unless_present = "reject")]
        approve: bool,

        #[arg(long)]
        reject: bool,
    },

    /// Delete a submitted checklist so it can be filled in again (manager)
    Reopen {
        submission: String,

        #[arg(long = "yes", short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// Follow a checklist live until Ctrl-C
    Watch { template: String },
}

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Load templates from a YAML or JSON file
    Import {
        #[arg(value_name = "FILE")]
        file: String,
    },

    /// List the templates of the store
    List,
}
