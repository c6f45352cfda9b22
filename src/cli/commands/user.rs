//! Account creation commands

use anyhow::Context;

use crate::config::Config;
use crate::db::{NewUser, Store};

pub async fn cmd_create_user(
    config: &Config,
    email: &str,
    name: &str,
    password: Option<String>,
    superuser: bool,
) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };

    if password.chars().count() < config.security.min_password_length {
        anyhow::bail!(
            "Password must be at least {} characters",
            config.security.min_password_length
        );
    }

    let store = Store::new(&config.general.database_path).await?;

    if store.get_user_by_email(email).await?.is_some() {
        anyhow::bail!("A user with email '{email}' already exists");
    }

    let new_user = if superuser {
        NewUser::superuser(email, &password)
    } else {
        NewUser::regular(email, &password, name)
    };

    let user = store.create_user(new_user, &config.security).await?;

    let kind = if superuser { "Superuser" } else { "User" };
    println!("✓ {kind} created: {} (id {})", user.email, user.id);
    println!("  API token: {}", user.api_key);

    Ok(())
}

fn read_password() -> anyhow::Result<String> {
    println!("Password:");
    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .context("Failed to read password from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
