use crate::config::Config;
use crate::domain::Identity;
use crate::state::SharedState;

pub async fn cmd_history(config: &Config, username: &str, limit: usize) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let user = state
        .store
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User '{username}' not found"))?;

    let history = state
        .search_service
        .get_history(&Identity::user(user.id, None))
        .await?;

    if history.searches.is_empty() {
        println!("No searches recorded for {username}.");
        return Ok(());
    }

    println!("Recent searches (last {}):", limit.min(history.searches.len()));
    println!("{:-<60}", "");
    for entry in history.searches.iter().take(limit) {
        println!("• {} | {}", entry.city.name, entry.searched_at);
    }

    println!();
    println!("Most searched:");
    for (rank, stat) in history.stats.iter().enumerate() {
        println!("{:>3}. {} ({})", rank + 1, stat.city_name, stat.count);
    }

    Ok(())
}
