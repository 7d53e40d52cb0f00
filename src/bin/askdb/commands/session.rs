use super::{anonymous_client, block_on};
use askdb::cache::Cache;
use askdb::context::ContextName;
use askdb::Error;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;

pub fn login(cache: &Cache, email: &str) -> Result<(), Error> {
    let client = anonymous_client(cache)?;
    let context = ContextName::current(cache)?;

    println!("Using context {}", context.to_string().bold().green());

    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .interact()?;

    let response = block_on(client.login(email, &password))?;

    let who = response
        .user
        .and_then(|user| user.name)
        .unwrap_or_else(|| email.to_string());
    println!("Logged in as {}", who.bold());

    Ok(())
}

pub fn logout(cache: &Cache) -> Result<(), Error> {
    anonymous_client(cache)?.logout()?;

    println!("Logged out");

    Ok(())
}
