use super::{block_on, client, confirm_dml, output, pick_connection, read_input};
use crate::args::ExecuteParams;
use askdb::api::{ApiClient, ExecuteRequest};
use askdb::cache::Cache;
use askdb::playground::is_dml;
use askdb::query::{ParameterizedQuery, QueryState};
use askdb::{compile_parameterized, Error, InternalError};

pub fn run(cache: &Cache, params: ExecuteParams) -> Result<(), Error> {
    let client = client(cache)?;

    block_on(execute(&client, params))
}

async fn execute(client: &ApiClient, params: ExecuteParams) -> Result<(), Error> {
    let connection_id = pick_connection(client, params.connection.clone()).await?;
    let query = query(client, &connection_id, &params).await?;

    if query.sql.trim().is_empty() {
        return Err(InternalError("There is no SQL to execute".to_string()).into());
    }

    if is_dml(&query.sql) && !params.output.yes && !confirm_dml(&query.sql)? {
        println!("Not running it");
        return Ok(());
    }

    let result = client
        .execute_query(&ExecuteRequest {
            connection_id,
            sql_query: query.sql,
            parameters: query.params,
        })
        .await?;

    output(&result, &params.output)
}

/// Query states are rendered for the connection's database, with values bound separately.
async fn query(
    client: &ApiClient,
    connection_id: &str,
    params: &ExecuteParams,
) -> Result<ParameterizedQuery, Error> {
    if let Some(sql) = &params.source.sql {
        return Ok(ParameterizedQuery {
            sql: sql.clone(),
            params: Vec::new(),
        });
    }

    let Some(path) = &params.source.state else {
        return Err(InternalError("Pass either --sql or --state".to_string()).into());
    };

    let state: QueryState = serde_json::from_str(&read_input(path)?)?;
    let connection = client.get_connection(connection_id).await?;
    let dialect = connection.dialect(client.config().dialect);

    Ok(compile_parameterized(&state, dialect))
}
