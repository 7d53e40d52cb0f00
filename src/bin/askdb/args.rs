use askdb::config::Config;
use askdb::context::Context;
use askdb::export::ExportFormat;
use askdb::query::Dialect;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Creates a context.
    ///
    /// Contexts allow the askdb command to switch between different API servers.
    CreateContext(ContextParams),
    /// Selects an existing context.
    UseContext { name: String },
    /// List available contexts.
    ListContexts,
    /// Logs in to the API of the current context.
    Login {
        #[arg(short, long)]
        email: String,
    },
    /// Forgets the token of the current context.
    Logout,
    /// Lists, adds or removes database connections.
    Connections {
        #[command(subcommand)]
        action: Option<ConnectionAction>,
    },
    /// Lists or creates playgrounds.
    Playgrounds {
        #[command(subcommand)]
        action: Option<PlaygroundAction>,
    },
    /// Shows the tables, columns and keys of a connection.
    Schema { connection: String },
    /// Turns a question into SQL.
    Ask(AskParams),
    /// Renders a query state (JSON) to SQL. Works offline.
    Compile(CompileParams),
    /// Runs SQL against a connection.
    Execute(ExecuteParams),
    /// Runs a local server that compiles query states to SQL.
    Serve {
        #[arg(long, default_value = "127.0.0.1:33333")]
        address: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct ContextParams {
    /// You can reuse your context by referencing this name
    name: String,
    /// Base url of the API, including the /api prefix
    #[arg(long = "url")]
    api_base_url: String,
    /// Used for connections of a type askdb doesn't know about.
    #[arg(long, default_value = "generic")]
    dialect: Dialect,
    /// Seconds before a request is given up on
    #[arg(long, default_value_t = 30)]
    timeout: u64,
    /// How many executions a playground remembers
    #[arg(long, default_value_t = 100)]
    history_limit: usize,
    /// Use the new context
    #[arg(long = "use")]
    pub use_it: bool,
}

impl From<ContextParams> for Context {
    fn from(value: ContextParams) -> Self {
        Context {
            name: value.name.into(),
            config: Config {
                api_base_url: value.api_base_url,
                request_timeout_secs: value.timeout,
                history_limit: value.history_limit,
                dialect: value.dialect,
                ..Config::default()
            },
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConnectionAction {
    List,
    Add(NewConnectionParams),
    Remove { id: String },
}

#[derive(clap::Args, Debug)]
pub struct NewConnectionParams {
    pub name: String,
    /// Database type: postgres, mysql, sqlite...
    #[arg(long = "type")]
    pub db_type: String,
    #[arg(long)]
    pub host: String,
    #[arg(short, long)]
    pub port: u16,
    #[arg(short, long)]
    pub username: String,
    #[arg(short, long)]
    pub database: String,
}

#[derive(Subcommand, Debug)]
pub enum PlaygroundAction {
    List,
    Create {
        name: String,
        #[arg(short, long)]
        connection: String,
    },
    /// Shows the execution history of a playground.
    History { id: String },
}

/// Where results end up.
#[derive(clap::Args, Debug)]
pub struct OutputParams {
    /// Prints (or writes) the results in this format instead of a table: json, csv or xml
    #[arg(short, long)]
    pub format: Option<ExportFormat>,
    /// Writes the results to a file. The format defaults to the file's extension.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    /// Runs queries that modify data without asking first
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct AskParams {
    pub prompt: String,
    /// Connection id. You get to pick one when missing.
    #[arg(short, long)]
    pub connection: Option<String>,
    /// Playground to generate in. The playground's connection is used.
    #[arg(short, long)]
    pub playground: Option<String>,
    /// Only accept queries that don't modify data
    #[arg(long)]
    pub read_only: bool,
    /// Run the generated SQL right away
    #[arg(short, long)]
    pub run: bool,
    #[command(flatten)]
    pub output: OutputParams,
}

#[derive(clap::Args, Debug)]
pub struct CompileParams {
    /// File with the query state, `-` for stdin
    pub state: PathBuf,
    /// Defaults to the dialect of the current context
    #[arg(short, long)]
    pub dialect: Option<Dialect>,
    /// Use bind placeholders instead of inlining values
    #[arg(long)]
    pub parameterized: bool,
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
pub struct QuerySource {
    /// The SQL to run
    #[arg(long)]
    pub sql: Option<String>,
    /// A query state file to compile and run, `-` for stdin
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ExecuteParams {
    #[command(flatten)]
    pub source: QuerySource,
    #[arg(short, long)]
    pub connection: Option<String>,
    #[command(flatten)]
    pub output: OutputParams,
}
