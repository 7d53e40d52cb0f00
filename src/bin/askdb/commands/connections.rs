use super::{block_on, client};
use crate::args::{ConnectionAction, NewConnectionParams};
use askdb::api::{ApiClient, NewConnection};
use askdb::cache::Cache;
use askdb::Error;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;

pub fn run(cache: &Cache, action: Option<ConnectionAction>) -> Result<(), Error> {
    let client = client(cache)?;

    match action.unwrap_or(ConnectionAction::List) {
        ConnectionAction::List => block_on(list(&client)),
        ConnectionAction::Add(params) => add(&client, params),
        ConnectionAction::Remove { id } => {
            block_on(client.delete_connection(&id))?;
            println!("Removed connection {}", id.bold());

            Ok(())
        }
    }
}

async fn list(client: &ApiClient) -> Result<(), Error> {
    let connections = client.list_connections().await?;

    if connections.is_empty() {
        println!("No connections yet");
    }

    for connection in connections {
        println!(
            "{:>6}  {} {}",
            connection.id,
            connection.name.bold(),
            [connection.db_type, connection.host, connection.database]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ")
                .dimmed()
        );
    }

    Ok(())
}

fn add(client: &ApiClient, params: NewConnectionParams) -> Result<(), Error> {
    // Goes straight to the API, we never store database passwords.
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Password for {}", params.username))
        .interact()?;

    let connection = NewConnection {
        name: params.name,
        db_type: params.db_type,
        host: params.host,
        port: params.port,
        database: params.database,
        username: params.username,
        password,
    };

    let created = block_on(client.create_connection(&connection))?;
    println!(
        "Added connection {} with id {}",
        created.name.bold(),
        created.id.bold()
    );

    Ok(())
}

pub fn schema(cache: &Cache, connection: &str) -> Result<(), Error> {
    let client = client(cache)?;
    let schema = block_on(client.connection_schema(connection))?;

    for table in &schema.tables {
        println!("{}", table.name.bold());

        for column in &table.columns {
            let key = if table.primary_key.contains(&column.name) {
                " PK".yellow().to_string()
            } else {
                String::new()
            };

            println!(
                "  {} {}{key}",
                column.name,
                column.data_type.as_deref().unwrap_or("").dimmed()
            );
        }

        for foreign_key in &table.foreign_keys {
            println!(
                "  {} ({}) -> {}({})",
                "FK".cyan(),
                foreign_key.columns.join(", "),
                foreign_key.referenced_table,
                foreign_key.referenced_columns.join(", ")
            );
        }
    }

    Ok(())
}
