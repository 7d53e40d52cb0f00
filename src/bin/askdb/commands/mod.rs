use crate::args::OutputParams;
use askdb::api::{ApiClient, CachedTokenStore, QueryResult};
use askdb::cache::Cache;
use askdb::context::Context;
use askdb::export::{export, ExportFormat};
use askdb::{Error, ErrorKind};
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, FuzzySelect};
use std::fs;
use std::future::Future;
use std::io::Read;
use std::path::Path;
use tokio::runtime::Builder;

pub mod ask;
pub mod compile;
pub mod connections;
pub mod execute;
pub mod playgrounds;
pub mod serve;
pub mod session;

/// Everything talking to the API is async, the CLI is not.
pub fn block_on<F: Future>(future: F) -> F::Output {
    // A single thread is plenty for one request at a time.
    let tokio = Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()
        .expect("Cannot build tokio runtime");

    tokio.block_on(future)
}

/// A client for the current context, without checking whether we're logged in.
pub fn anonymous_client(cache: &Cache) -> Result<ApiClient, Error> {
    let context = Context::current(cache)?;
    let tokens = CachedTokenStore::new(cache.clone(), context.name.clone());

    ApiClient::new(context.config, tokens)
}

pub fn client(cache: &Cache) -> Result<ApiClient, Error> {
    let client = anonymous_client(cache)?;

    if !client.is_logged_in() {
        return Err(ErrorKind::NotLoggedIn.into());
    }

    Ok(client)
}

/// Reads a file, or stdin for `-`.
pub fn read_input(path: &Path) -> Result<String, Error> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;

        return Ok(input);
    }

    Ok(fs::read_to_string(path)?)
}

/// Lets the user pick a connection when none was given.
pub async fn pick_connection(client: &ApiClient, given: Option<String>) -> Result<String, Error> {
    if let Some(connection) = given {
        return Ok(connection);
    }

    let connections = client.list_connections().await?;

    if connections.is_empty() {
        return Err(askdb::InternalError(
            "There are no connections yet, add one with `askdb connections add`".to_string(),
        )
        .into());
    }

    let names: Vec<String> = connections
        .iter()
        .map(|connection| format!("{} ({})", connection.name, connection.id))
        .collect();

    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Connection")
        .items(&names)
        .default(0)
        .interact()?;

    Ok(connections[selection].id.clone())
}

pub fn confirm_dml(sql: &str) -> Result<bool, Error> {
    println!("{}\n{sql}", "This query modifies data:".yellow().bold());

    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Run it anyway?")
        .default(false)
        .interact()?)
}

/// Prints results as a table, or exports them when asked to.
pub fn output(result: &QueryResult, params: &OutputParams) -> Result<(), Error> {
    let format = params.format.or_else(|| {
        params
            .out
            .as_deref()
            .and_then(|out| out.extension())
            .and_then(|extension| extension.to_str())
            .and_then(|extension| extension.parse().ok())
    });

    match (&params.out, format) {
        (Some(out), format) => {
            let format = format.unwrap_or(ExportFormat::Json);
            fs::write(out, export(result, format)?)?;

            println!(
                "Wrote {} rows to {}",
                result.rows.len(),
                out.display().to_string().bold()
            );
        }
        (None, Some(format)) => println!("{}", export(result, format)?),
        (None, None) => print_table(result),
    }

    Ok(())
}

fn print_table(result: &QueryResult) {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .map(|column| cell(result.value(row, column)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let header: Vec<String> = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{column:width$}").bold().to_string())
        .collect();
    println!("{}", header.join(" | "));

    for row in cells {
        let row: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:width$}"))
            .collect();
        println!("{}", row.join(" | "));
    }

    println!(
        "{} rows in {}ms",
        result.total_rows.max(result.rows.len() as u64),
        result.execution_time
    );
}

fn cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(text) => text.replace('\n', " "),
        other => other.to_string(),
    }
}
