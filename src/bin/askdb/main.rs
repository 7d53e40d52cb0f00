mod args;
mod commands;

use crate::args::{Command, ContextParams};
use args::Args;
use askdb::cache::Cache;
use askdb::context::{Context, ContextName};
use askdb::Error;
use clap::Parser;
use colored::Colorize;
use std::process::exit;

fn main() {
    let args = Args::parse();

    // The server logs through tracing, which also picks up `log` records.
    if !matches!(args.command, Command::Serve { .. }) {
        env_logger::init();
    }

    if let Err(error) = run(args.command) {
        eprintln!("{intro}: {error}", intro = "error".bold().red());

        if error.is_unauthorized() || matches!(error.kind(), askdb::ErrorKind::NotLoggedIn) {
            eprintln!("Log in with {}", "askdb login --email <email>".bold());
        }

        exit(1);
    }
}

fn run(command: Command) -> Result<(), Error> {
    let cache = Cache::user_cache()?;

    match command {
        Command::CreateContext(context) => create_context(&cache, context),
        Command::UseContext { name } => use_context(&cache, name),
        Command::ListContexts => list_contexts(&cache),
        Command::Login { email } => commands::session::login(&cache, &email),
        Command::Logout => commands::session::logout(&cache),
        Command::Connections { action } => commands::connections::run(&cache, action),
        Command::Playgrounds { action } => commands::playgrounds::run(&cache, action),
        Command::Schema { connection } => commands::connections::schema(&cache, &connection),
        Command::Ask(params) => commands::ask::run(&cache, params),
        Command::Compile(params) => commands::compile::run(&cache, params),
        Command::Execute(params) => commands::execute::run(&cache, params),
        Command::Serve { address } => commands::serve::run(&address),
    }
}

fn create_context(cache: &Cache, params: ContextParams) -> Result<(), Error> {
    let use_it = params.use_it;
    let new_context: Context = params.into();

    cache.write(&new_context)?;

    println!("Created new context {}.", new_context.name.to_string().bold());

    if use_it {
        use_context(cache, new_context.name.into())?;
    } else {
        println!(
            "Switch to it by running {}.",
            format!("askdb use-context {}", new_context.name).bold()
        );
    }

    Ok(())
}

fn use_context(cache: &Cache, name: String) -> Result<(), Error> {
    let context_name: ContextName = name.into();

    // Catches typos, switching to a context that does not exist would break every other command.
    cache.read::<Context, _>(&context_name)?;
    cache.write(&context_name)?;

    println!("Switched to context {}.", context_name.to_string().bold());

    Ok(())
}

fn list_contexts(cache: &Cache) -> Result<(), Error> {
    let current_context = ContextName::current(cache).ok();
    let known_contexts: Vec<Context> = cache.read_all()?;

    println!("Available contexts:");
    for context in &known_contexts {
        println!(
            "{}{}: {} ({})",
            if current_context.as_ref() == Some(&context.name) {
                " * ".bold()
            } else {
                "   ".into()
            },
            context.name.to_string().bold(),
            context.config.api_base_url,
            context.config.dialect
        )
    }

    Ok(())
}
