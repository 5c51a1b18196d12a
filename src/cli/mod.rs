//! CLI module - Command-line interface for Weatherdesk
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Weatherdesk - city weather lookups with search history
#[derive(Parser)]
#[command(name = "weatherdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the JSON API server
    #[command(alias = "web", alias = "daemon")]
    Serve,

    /// Look up a city, record the search and print its forecast
    #[command(alias = "l", alias = "weather")]
    Lookup {
        /// City name
        #[arg(required = true)]
        city: Vec<String>,

        /// Record the search for this user instead of anonymously
        #[arg(long)]
        user: Option<String>,

        /// Only resolve and record, skip the forecast
        #[arg(long)]
        no_forecast: bool,
    },

    /// Suggest city names for a prefix
    #[command(alias = "ac")]
    Autocomplete {
        /// Name prefix (at least 2 characters)
        prefix: String,
    },

    /// Show a user's search history and most searched cities
    #[command(alias = "h")]
    History {
        /// Username
        username: String,

        /// Number of searches to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user and print its API key
    Add {
        username: String,

        #[arg(long)]
        password: String,
    },
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_word_lookup() {
        let cli = Cli::try_parse_from(["weatherdesk", "lookup", "New", "York", "--user", "admin"])
            .unwrap();
        match cli.command {
            Some(Commands::Lookup {
                city,
                user,
                no_forecast,
            }) => {
                assert_eq!(city.join(" "), "New York");
                assert_eq!(user.as_deref(), Some("admin"));
                assert!(!no_forecast);
            }
            _ => panic!("expected lookup"),
        }
    }

    #[test]
    fn parses_user_add() {
        let cli = Cli::try_parse_from(["weatherdesk", "user", "add", "bob", "--password", "s3cret!"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::User {
                command: UserCommands::Add { .. }
            })
        ));
    }

    #[test]
    fn lookup_requires_city() {
        assert!(Cli::try_parse_from(["weatherdesk", "lookup"]).is_err());
    }
}
