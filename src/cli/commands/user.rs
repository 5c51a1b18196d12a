use crate::config::Config;
use crate::db::Store;

pub async fn cmd_user_add(config: &Config, username: &str, password: &str) -> anyhow::Result<()> {
    if username.trim().is_empty() {
        anyhow::bail!("Username cannot be empty");
    }
    if password.len() < 8 {
        anyhow::bail!("Password must be at least 8 characters");
    }

    let store = Store::new(&config.general.database_path).await?;
    let user = store
        .create_user(username.trim(), password, &config.security)
        .await?;

    println!("Created user '{}' (ID: {})", user.username, user.id);
    println!("API key: {}", user.api_key);

    Ok(())
}
