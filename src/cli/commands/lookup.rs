use crate::config::Config;
use crate::domain::Identity;
use crate::services::WeatherReport;
use crate::state::SharedState;

/// Searches made from the command line are attributed to this pseudo address.
const CLI_CLIENT_IP: &str = "cli";

async fn identity_for(state: &SharedState, username: Option<&str>) -> anyhow::Result<Identity> {
    let Some(username) = username else {
        return Ok(Identity::anonymous(CLI_CLIENT_IP));
    };

    let user = state
        .store
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User '{username}' not found"))?;

    Ok(Identity::user(user.id, None))
}

pub async fn cmd_lookup(
    config: &Config,
    city: &str,
    username: Option<&str>,
    no_forecast: bool,
) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let identity = identity_for(&state, username).await?;

    if no_forecast {
        let lookup = state.search_service.lookup_and_record(&identity, city).await?;
        println!(
            "{} ({:.2}, {:.2}) [ID: {}]",
            lookup.city.name, lookup.city.latitude, lookup.city.longitude, lookup.city.id
        );
        return Ok(());
    }

    let report = state.search_service.weather(&identity, city).await?;
    print_report(&report);

    Ok(())
}

fn print_report(report: &WeatherReport) {
    let fmt_temp =
        |t: Option<f64>| t.map_or_else(|| "  ?".to_string(), |t| format!("{t:>5.1}°C"));

    println!(
        "{} ({:.2}, {:.2})",
        report.city.name, report.city.latitude, report.city.longitude
    );
    println!("{:-<50}", "");
    println!(
        "Now: {} {} | wind {} km/h",
        fmt_temp(report.current.temperature),
        report.current.weather,
        report
            .current
            .windspeed
            .map_or_else(|| "?".to_string(), |w| format!("{w:.0}"))
    );

    if !report.daily.is_empty() {
        println!();
        println!("Daily:");
        for day in &report.daily {
            println!(
                "  {}  {} / {}  {}",
                day.date,
                fmt_temp(day.min_temp),
                fmt_temp(day.max_temp),
                day.weather
            );
        }
    }

    if !report.recent.is_empty() {
        println!();
        let names: Vec<_> = report.recent.iter().map(|c| c.name.as_str()).collect();
        println!("Recent: {}", names.join(", "));
    }
}

pub async fn cmd_autocomplete(config: &Config, prefix: &str) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let names = state.search_service.autocomplete(prefix).await?;

    if names.is_empty() {
        println!("No suggestions for '{prefix}'");
        return Ok(());
    }

    for name in names {
        println!("• {name}");
    }

    Ok(())
}
