//! A playground pairs a connection with a prompt, the SQL generated for it, and a history of
//! executions.
//!
//! Generating and executing both go through a [`Backend`], which in practice is the
//! [`ApiClient`](crate::api::ApiClient).
mod ai_response;
mod history;

pub use ai_response::{unwrap_generated, GeneratedSql};
pub use history::{History, HistoryItem, Outcome};

use crate::api::{
    ExecuteRequest, GenerateRequest, GeneratedQuery, PlaygroundRecord, PlaygroundUpdate,
    QueryResult,
};
use crate::config::Config;
use crate::Error;
use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PlaygroundError {
    #[error("There is no SQL to execute")]
    NoSql,
    #[error("The playground has no connection")]
    NoConnection,
    #[error("The prompt is empty")]
    EmptyPrompt,
    #[error("This query modifies data and needs to be confirmed before running")]
    DmlNotConfirmed,
    #[error("Could not find any SQL in the generated response:\n{0}")]
    UnreadableResponse(String),
}

/// The remote side of a playground.
#[async_trait]
pub trait Backend {
    async fn generate_sql(&self, request: &GenerateRequest) -> Result<GeneratedQuery, Error>;
    async fn execute_sql(&self, request: &ExecuteRequest) -> Result<QueryResult, Error>;
    async fn save_playground(&self, id: &str, update: &PlaygroundUpdate) -> Result<(), Error>;
}

/// What a playground is busy with.
///
/// Operations take `&mut self`, so from the outside a playground is always `Idle` between calls.
/// The busy states only show up in logs and `Debug` output taken while a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Generating,
    Executing,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            Status::Idle => "idle",
            Status::Generating => "generating",
            Status::Executing => "executing",
        };

        write!(f, "{status}")
    }
}

pub struct Playground<B: Backend> {
    backend: B,
    id: Option<String>,
    name: String,
    connection_id: Option<String>,
    enforce_dql: bool,
    status: Status,
    current_sql: String,
    current_prompt: Option<String>,
    current_explanation: Option<String>,
    last_result: Option<QueryResult>,
    error: Option<String>,
    history: History,
}

impl<B: Backend> Playground<B> {
    /// Picks up a playground where it was last left.
    pub fn new(backend: B, record: PlaygroundRecord, config: &Config) -> Self {
        Playground {
            backend,
            id: Some(record.id),
            name: record.name,
            connection_id: record.connection_id,
            enforce_dql: false,
            status: Status::Idle,
            current_sql: record.current_sql.unwrap_or_default(),
            current_prompt: record.current_prompt.filter(|prompt| !prompt.is_empty()),
            current_explanation: None,
            last_result: None,
            error: None,
            history: History::from_items(record.history, config.history_limit),
        }
    }

    /// A playground that only lives in memory, nothing gets saved.
    pub fn scratch(backend: B, connection_id: Option<String>, config: &Config) -> Self {
        Playground {
            backend,
            id: None,
            name: "scratch".to_string(),
            connection_id,
            enforce_dql: false,
            status: Status::Idle,
            current_sql: String::new(),
            current_prompt: None,
            current_explanation: None,
            last_result: None,
            error: None,
            history: History::new(config.history_limit),
        }
    }

    /// Asks the generator for read-only queries only.
    pub fn enforce_dql(mut self, enforce: bool) -> Self {
        self.enforce_dql = enforce;
        self
    }

    /// Replaces the current SQL with whatever the generator comes up with for `prompt`.
    ///
    /// If generation fails the error is kept in [`Playground::error`] and the previous SQL stays.
    pub async fn generate_sql_from_prompt(&mut self, prompt: &str) -> Result<&str, Error> {
        let prompt = prompt.trim();

        if prompt.is_empty() {
            return Err(PlaygroundError::EmptyPrompt.into());
        }

        let connection_id = self
            .connection_id
            .clone()
            .ok_or(PlaygroundError::NoConnection)?;

        let request = GenerateRequest {
            prompt: prompt.to_string(),
            connection_id,
            playground_id: self.id.clone(),
            enforce_dql: self.enforce_dql.then_some(true),
        };

        self.status = Status::Generating;
        self.error = None;
        info!("Playground {} is {}", self.name, self.status);

        let generated = match self.backend.generate_sql(&request).await {
            Ok(response) => unwrap_generated(&response).map_err(Error::from),
            Err(error) => Err(error),
        };

        self.status = Status::Idle;

        match generated {
            Ok(generated) => {
                self.current_sql = generated.sql;
                self.current_explanation = generated.explanation;
                self.current_prompt = Some(prompt.to_string());

                Ok(self.current_sql.as_str())
            }
            Err(error) => {
                self.error = Some(error.to_string());

                Err(error)
            }
        }
    }

    /// Runs the current SQL and records the outcome in the history.
    ///
    /// Statements that modify data only run with `allow_dml`. Whatever happens, the playground
    /// is saved afterwards; failing to save is logged, not returned.
    pub async fn execute_query(&mut self, allow_dml: bool) -> Result<&QueryResult, Error> {
        let sql = self.current_sql.trim().to_string();

        if sql.is_empty() {
            return Err(PlaygroundError::NoSql.into());
        }

        let connection_id = self
            .connection_id
            .clone()
            .ok_or(PlaygroundError::NoConnection)?;

        if !allow_dml && is_dml(&sql) {
            return Err(PlaygroundError::DmlNotConfirmed.into());
        }

        let request = ExecuteRequest {
            connection_id,
            sql_query: sql.clone(),
            parameters: Vec::new(),
        };

        self.status = Status::Executing;
        self.error = None;
        info!("Playground {} is {}", self.name, self.status);

        let result = self.backend.execute_sql(&request).await;

        self.status = Status::Idle;

        let outcome = match &result {
            Ok(result) => Outcome::Success {
                row_count: result.total_rows.max(result.rows.len() as u64),
                execution_time: result.execution_time,
            },
            Err(error) => Outcome::Error {
                message: error.to_string(),
            },
        };

        self.history.push(HistoryItem {
            prompt: self.current_prompt.clone(),
            sql,
            explanation: self.current_explanation.clone(),
            executed_at: Utc::now(),
            outcome,
        });

        self.save().await;

        match result {
            Ok(result) => Ok(&*self.last_result.insert(result)),
            Err(error) => {
                self.error = Some(error.to_string());

                Err(error)
            }
        }
    }

    /// Brings back the SQL, prompt and explanation of a past execution, without running it.
    pub fn select_history_item(&mut self, index: usize) -> Option<&HistoryItem> {
        let item = self.history.get(index)?;

        self.current_sql = item.sql.clone();
        self.current_prompt = item.prompt.clone();
        self.current_explanation = item.explanation.clone();
        self.error = None;

        Some(item)
    }

    /// For SQL written by hand.
    pub fn set_sql(&mut self, sql: &str) {
        self.current_sql = sql.to_string();
        self.current_explanation = None;
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn current_sql(&self) -> &str {
        &self.current_sql
    }

    pub fn current_prompt(&self) -> Option<&str> {
        self.current_prompt.as_deref()
    }

    pub fn current_explanation(&self) -> Option<&str> {
        self.current_explanation.as_deref()
    }

    pub fn last_result(&self) -> Option<&QueryResult> {
        self.last_result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    async fn save(&self) {
        let Some(id) = &self.id else {
            return;
        };

        let update = PlaygroundUpdate {
            current_sql: self.current_sql.clone(),
            current_prompt: self.current_prompt.clone().unwrap_or_default(),
            history: self.history.to_vec(),
        };

        if let Err(error) = self.backend.save_playground(id, &update).await {
            warn!("Could not save playground {id}: {error}");
        }
    }
}

static LEADING_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s(]*([A-Za-z]+)").expect("valid regex"));
static DML_IN_CTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(INSERT|UPDATE|DELETE|MERGE)\b").expect("valid regex"));

const DML_KEYWORDS: [&str; 13] = [
    "INSERT", "UPDATE", "DELETE", "MERGE", "UPSERT", "REPLACE", "TRUNCATE", "DROP", "ALTER",
    "CREATE", "GRANT", "REVOKE", "RENAME",
];

/// Whether any statement in `sql` writes data or changes the schema.
///
/// Looks at the first keyword of each statement. A `WITH` counts if it has a write anywhere in it.
/// Quoted text and comments are ignored. Since databases disagree on whether `\'` ends a string,
/// both readings are checked and either one flagging the SQL is enough.
pub fn is_dml(sql: &str) -> bool {
    [false, true]
        .into_iter()
        .any(|backslash_escapes| has_write(&mask_quotes_and_comments(sql, backslash_escapes)))
}

fn has_write(sql: &str) -> bool {
    sql.split(';').any(|statement| {
        let Some(keyword) = LEADING_KEYWORD.captures(statement) else {
            return false;
        };
        let keyword = keyword[1].to_ascii_uppercase();

        if keyword == "WITH" {
            return DML_IN_CTE.is_match(statement);
        }

        DML_KEYWORDS.contains(&keyword.as_str())
    })
}

/// Replaces every quoted string or identifier with `_` and every comment with whitespace, leaving
/// only the structure of the statements.
fn mask_quotes_and_comments(sql: &str, backslash_escapes: bool) -> String {
    let mut masked = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                skip_quoted(&mut chars, c, backslash_escapes);
                masked.push('_');
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                masked.push('\n');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = ' ';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                masked.push(' ');
            }
            c => masked.push(c),
        }
    }

    masked
}

/// Consumes up to and including the closing quote. Doubled quotes don't close.
fn skip_quoted(chars: &mut Peekable<Chars>, quote: char, backslash_escapes: bool) {
    while let Some(c) = chars.next() {
        if c == '\\' && backslash_escapes {
            chars.next();
        } else if c == quote {
            if chars.peek() == Some(&quote) {
                chars.next();
            } else {
                return;
            }
        }
    }
}
