use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stream_engine::SearchArgs;

#[derive(Parser, Debug)]
#[command(version, about = "Search site activity stored in a remote log service")]
pub struct Cli {
    /// Action to perform. If omitted, runs a search and pages through it.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// RON configuration file; a missing file means defaults.
    #[arg(
        long,
        short = 'c',
        value_name = "FILE",
        default_value = "stream.ron",
        global = true
    )]
    pub config: PathBuf,

    /// Also write logs to this file.
    #[arg(long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log debug output.
    #[arg(long, short = 'v', default_value_t = false, global = true)]
    pub verbose: bool,

    #[clap(flatten)]
    pub search: SearchOpts,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Post one JSON activity record to the receiver endpoint.
    Forward {
        /// JSON object, e.g. '{"summary":"Post updated","user_id":1}'.
        record: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchOpts {
    /// Free-text search term.
    #[arg(long, short = 's')]
    pub search: Option<String>,

    #[arg(long = "object-id")]
    pub object_id: Option<i64>,

    #[arg(long = "user-id")]
    pub user_id: Option<i64>,

    #[arg(long = "user-role")]
    pub user_role: Option<String>,

    #[arg(long)]
    pub connector: Option<String>,

    #[arg(long)]
    pub context: Option<String>,

    #[arg(long)]
    pub action: Option<String>,

    /// Single day to search, overrides --from/--to.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,

    #[arg(long = "from", value_name = "YYYY-MM-DD")]
    pub date_from: Option<String>,

    #[arg(long = "to", value_name = "YYYY-MM-DD")]
    pub date_to: Option<String>,

    /// Rows shown per screen; press Enter for the next one.
    #[arg(long, default_value_t = 40)]
    pub rows: u64,

    /// Load every page without waiting for input.
    #[arg(long, default_value_t = false)]
    pub all: bool,

    /// Print rows as HTML table rows instead of tab-separated text.
    #[arg(long, default_value_t = false)]
    pub html: bool,
}

impl SearchOpts {
    pub fn to_args(&self) -> SearchArgs {
        SearchArgs {
            search: self.search.clone(),
            object_id: self.object_id,
            user_id: self.user_id,
            user_role: self.user_role.clone(),
            connector: self.connector.clone(),
            context: self.context.clone(),
            action: self.action.clone(),
            date: self.date.clone(),
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
        }
    }
}
