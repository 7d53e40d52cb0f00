use super::read_input;
use crate::args::CompileParams;
use askdb::cache::Cache;
use askdb::context::Context;
use askdb::query::{Dialect, QueryState};
use askdb::{compile, compile_parameterized, Error};
use colored::Colorize;
use log::debug;

pub fn run(cache: &Cache, params: CompileParams) -> Result<(), Error> {
    let state: QueryState = serde_json::from_str(&read_input(&params.state)?)?;
    let dialect = params.dialect.unwrap_or_else(|| default_dialect(cache));

    if !params.parameterized {
        print(&compile(&state, dialect));

        return Ok(());
    }

    let query = compile_parameterized(&state, dialect);
    print(&query.sql);

    if !query.params.is_empty() {
        println!("{}", serde_json::to_string(&query.params)?.dimmed());
    }

    Ok(())
}

/// The current context's dialect, when there is a current context.
pub fn default_dialect(cache: &Cache) -> Dialect {
    match Context::current(cache) {
        Ok(context) => context.config.dialect,
        Err(error) => {
            debug!("No current context, rendering generic SQL: {error}");
            Dialect::default()
        }
    }
}

fn print(sql: &str) {
    if sql.is_empty() {
        eprintln!("Nothing to compile, pick a table and some columns first");
    } else {
        println!("{sql}");
    }
}
