use super::{block_on, client, confirm_dml, output, pick_connection};
use crate::args::AskParams;
use askdb::api::ApiClient;
use askdb::cache::Cache;
use askdb::playground::{is_dml, Playground};
use askdb::Error;
use colored::Colorize;

pub fn run(cache: &Cache, params: AskParams) -> Result<(), Error> {
    let client = client(cache)?;

    block_on(ask(client, params))
}

async fn ask(client: ApiClient, params: AskParams) -> Result<(), Error> {
    let config = client.config().clone();

    let playground = match &params.playground {
        Some(id) => {
            let record = client.get_playground(id).await?;
            Playground::new(client, record, &config)
        }
        None => {
            let connection = pick_connection(&client, params.connection.clone()).await?;
            Playground::scratch(client, Some(connection), &config)
        }
    };
    let mut playground = playground.enforce_dql(params.read_only);

    let sql = playground.generate_sql_from_prompt(&params.prompt).await?;
    println!("{sql}");

    if let Some(explanation) = playground.current_explanation() {
        println!("\n{}", explanation.dimmed());
    }

    if !params.run {
        return Ok(());
    }

    println!();

    let allow_dml = is_dml(playground.current_sql());

    if allow_dml && !params.output.yes && !confirm_dml(playground.current_sql())? {
        println!("Not running it");
        return Ok(());
    }

    let result = playground.execute_query(allow_dml).await?;

    output(result, &params.output)
}
