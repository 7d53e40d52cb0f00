use super::{block_on, client};
use crate::args::PlaygroundAction;
use askdb::api::NewPlayground;
use askdb::cache::Cache;
use askdb::playground::Outcome;
use askdb::Error;
use colored::Colorize;

pub fn run(cache: &Cache, action: Option<PlaygroundAction>) -> Result<(), Error> {
    let client = client(cache)?;

    match action.unwrap_or(PlaygroundAction::List) {
        PlaygroundAction::List => {
            for playground in block_on(client.list_playgrounds())? {
                println!(
                    "{:>6}  {} {}",
                    playground.id,
                    playground.name.bold(),
                    playground
                        .connection_id
                        .map(|id| format!("(connection {id})"))
                        .unwrap_or_default()
                        .dimmed()
                );
            }
        }
        PlaygroundAction::Create { name, connection } => {
            let playground = block_on(client.create_playground(&NewPlayground {
                name,
                connection_id: connection,
            }))?;

            println!(
                "Created playground {} with id {}",
                playground.name.bold(),
                playground.id.bold()
            );
        }
        PlaygroundAction::History { id } => {
            let playground = block_on(client.get_playground(&id))?;

            for (index, item) in playground.history.iter().enumerate() {
                let outcome = match &item.outcome {
                    Outcome::Success {
                        row_count,
                        execution_time,
                    } => format!("{row_count} rows, {execution_time}ms").green(),
                    Outcome::Error { message } => message.red(),
                };

                println!(
                    "{} {} {}",
                    format!("#{index}").bold(),
                    item.executed_at.format("%Y-%m-%d %H:%M:%S"),
                    outcome
                );
                if let Some(prompt) = &item.prompt {
                    println!("   {}", prompt.italic());
                }
                println!("   {}", item.sql.replace('\n', "\n   "));
            }
        }
    }

    Ok(())
}
