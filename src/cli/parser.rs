use crate::export::ExportFormat;
use clap::{Args, Parser, Subcommand};

/// Command-line interface definition for rTimeclock
#[derive(Parser)]
#[command(
    name = "rtimeclock",
    version = env!("CARGO_PKG_VERSION"),
    about = "A time-clock client: pick yourself or a role, clock in and out on job codes, handle interruptions",
    long_about = None
)]
pub struct Cli {
    /// Override the local store path (useful for tests or a second kiosk)
    #[arg(global = true, long = "store")]
    pub store: Option<String>,

    /// Override the API base URL (e.g. http://localhost:8000/api/v1)
    #[arg(global = true, long = "api")]
    pub api: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Job selection shared by start / switch / interrupt.
#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    /// Job category (role) id
    #[arg(long = "category", short = 'c')]
    pub category: i64,

    /// Job code id, required when the category has codes
    #[arg(long = "code", short = 'j')]
    pub code: Option<i64>,
}

/// Filters for entry listing and export.
#[derive(Args, Debug, Clone, Default)]
pub struct EntryFilterArgs {
    #[arg(long = "employee")]
    pub employee: Option<i64>,

    #[arg(long = "category")]
    pub category: Option<i64>,

    /// First day (YYYY-MM-DD)
    #[arg(long = "from")]
    pub from: Option<String>,

    /// Last day (YYYY-MM-DD)
    #[arg(long = "to")]
    pub to: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the local store and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Editor to use (vim, nano, or a path)")]
        editor: Option<String>,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// List employees
    Employees,

    /// Select the employee using this terminal
    Select {
        /// Employee id (see `employees`)
        employee_id: i64,
    },

    /// Enter the selected employee's 4-digit PIN
    Login {
        #[arg(long = "pin")]
        pin: String,
    },

    /// Forget the selected employee and their login
    Logout,

    /// Show the current clock state
    Status,

    /// List job categories and their job codes
    Jobs,

    /// Clock in
    Start {
        #[command(flatten)]
        job: JobArgs,

        #[arg(long = "description", short = 'd')]
        description: Option<String>,

        /// Photo to attach after the entry is created (repeatable, max 5)
        #[arg(long = "photo", value_name = "FILE")]
        photos: Vec<String>,

        /// Caption applied to every attached photo
        #[arg(long = "caption")]
        caption: Option<String>,
    },

    /// Clock out
    Stop,

    /// Close the running job and start another
    Switch {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Pause the running job for an interruption
    Interrupt {
        #[command(flatten)]
        job: JobArgs,

        #[arg(long = "reason", short = 'r')]
        reason: String,
    },

    /// End the interruption and resume the paused job
    Resume,

    /// Toggle an activity tag on the running entry
    Tag {
        tag_id: i64,
    },

    /// Keep polling the server and print state changes
    Watch {
        /// Seconds between polls (default: poll_interval_secs)
        #[arg(long = "interval")]
        interval: Option<u64>,

        /// Stop after this many polls
        #[arg(long = "count")]
        count: Option<u64>,
    },

    /// Role-based sessions (no employee)
    Session {
        #[command(subcommand)]
        action: SessionCmd,
    },

    /// List activity tags
    Tags {
        /// Only tags available for this role
        #[arg(long = "role")]
        role: Option<i64>,
    },

    /// Attach or remove photos
    Photo {
        #[command(subcommand)]
        action: PhotoCmd,
    },

    /// Role hours, tag usage and start-time patterns
    Insights {
        /// First day (YYYY-MM-DD, default: 7 days ago)
        #[arg(long = "from")]
        from: Option<String>,

        /// Last day (YYYY-MM-DD, default: today)
        #[arg(long = "to")]
        to: Option<String>,

        /// Narrow tags and patterns to one role
        #[arg(long = "role")]
        role: Option<i64>,
    },

    /// Review, edit, delete or export time entries
    Entries {
        #[command(subcommand)]
        action: EntriesCmd,
    },

    /// Employee management (admin password required)
    Admin {
        #[command(subcommand)]
        action: AdminCmd,
    },
}

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Start a session, or switch when one is running
    #[command(alias = "switch")]
    Start {
        #[arg(long = "role")]
        role: i64,

        #[arg(long = "code")]
        code: Option<i64>,

        /// Initial activity tag (repeatable, fresh start only)
        #[arg(long = "tag")]
        tags: Vec<i64>,
    },

    /// Stop the running session
    Stop,

    /// Show the running session
    Status,

    /// Toggle an activity tag on the running session
    Tag { tag_id: i64 },

    /// Show, set or clear the performer name
    Name {
        name: Option<String>,

        #[arg(long = "clear", conflicts_with = "name")]
        clear: bool,
    },
}

#[derive(Subcommand)]
pub enum PhotoCmd {
    /// Upload photos to an existing entry
    Add {
        entry_id: i64,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<String>,

        #[arg(long = "caption")]
        caption: Option<String>,
    },

    /// Delete a photo
    Delete { photo_id: i64 },
}

#[derive(Subcommand)]
pub enum EntriesCmd {
    /// List time entries
    List {
        #[command(flatten)]
        filters: EntryFilterArgs,
    },

    /// Export time entries
    Export {
        #[command(flatten)]
        filters: EntryFilterArgs,

        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Edit start, end or description of an entry
    Edit {
        id: i64,

        /// New start (YYYY-MM-DD HH:MM, local time)
        #[arg(long = "start")]
        start: Option<String>,

        /// New end (YYYY-MM-DD HH:MM, local time)
        #[arg(long = "end")]
        end: Option<String>,

        #[arg(long = "description")]
        description: Option<String>,
    },

    /// Delete an entry
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum AdminCmd {
    /// Check the admin password and remember it
    Login {
        #[arg(long = "password")]
        password: String,
    },

    /// Forget the admin password
    Logout,

    /// List employees with PIN status
    List,

    /// Add an employee
    Add {
        #[arg(long = "first")]
        first_name: String,

        #[arg(long = "last")]
        last_name: String,

        #[arg(long = "email")]
        email: Option<String>,

        /// Optional PIN (4-10 digits)
        #[arg(long = "pin")]
        pin: Option<String>,
    },

    /// Set or reset an employee's PIN (4-10 digits)
    SetPin {
        employee_id: i64,

        #[arg(long = "pin")]
        pin: String,
    },

    /// Delete an employee
    Delete { employee_id: i64 },
}
