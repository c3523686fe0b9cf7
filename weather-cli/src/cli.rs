use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::Path;
use weather_proxy_core::{Config, Endpoint, ParamValue, Params, WeatherApiClient};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-proxy", version, about = "WeatherAPI.com proxy")]
pub struct Cli {
    /// API token; overrides the configured one.
    #[arg(long, global = true, env = "WEATHERAPI_KEY")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API token and upstream settings.
    Configure,

    /// Send one request and print the response.
    Fetch {
        /// Request parameter as name=value, e.g. `-p q=Paris -p days=3`.
        #[arg(short, long = "param", value_parser = parse_param, required = true)]
        params: Vec<(String, ParamValue)>,

        /// Upstream method, e.g. "current" or "forecast".
        #[arg(long)]
        endpoint: Option<Endpoint>,
    },

    /// Run the web application.
    Serve {
        /// Address to listen on, e.g. "0.0.0.0:8000".
        #[arg(long)]
        bind: Option<String>,
    },
}

fn parse_param(s: &str) -> anyhow::Result<(String, ParamValue)> {
    Params::parse_pair(s)
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let lenient = matches!(self.command, Command::Configure);
        let mut config = load_config(&Config::config_file_path()?, lenient)?;
        if let Some(token) = self.token {
            config.set_token(token);
        }

        match self.command {
            Command::Configure => configure(config),
            Command::Fetch { params, endpoint } => {
                if let Some(endpoint) = endpoint {
                    config.api.endpoint = endpoint;
                }

                let token = config.require_token()?;
                let mut client = WeatherApiClient::with_config(token, &config.api);
                client.set_params(params.into_iter().collect());

                let response = client
                    .send()
                    .await
                    .with_context(|| format!("Request to {} failed", client.url()))?;

                println!("{}", serde_json::to_string_pretty(&response)?);
                Ok(())
            }
            Command::Serve { bind } => {
                if let Some(bind) = bind {
                    config.server.bind = bind;
                }
                server::run(config).await
            }
        }
    }
}

/// With `lenient`, an unreadable or unparsable file yields the defaults.
fn load_config(path: &Path, lenient: bool) -> anyhow::Result<Config> {
    match Config::load_from(path) {
        Ok(config) => Ok(config),
        Err(err) if lenient => {
            tracing::warn!(error = %format!("{err:#}"), "ignoring unreadable config, starting from defaults");
            Ok(Config::default())
        }
        Err(err) => Err(err),
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let token = inquire::Password::new("WeatherAPI.com key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let base_url = inquire::Text::new("Base URL:")
        .with_default(&config.api.base_url)
        .prompt()
        .context("Failed to read base URL")?;

    let endpoint = inquire::Select::new("Default endpoint:", Endpoint::all().to_vec())
        .with_starting_cursor(
            Endpoint::all().iter().position(|e| *e == config.api.endpoint).unwrap_or(0),
        )
        .prompt()
        .context("Failed to read endpoint")?;

    if !token.trim().is_empty() {
        config.set_token(token.trim().to_string());
    }
    config.api.base_url = base_url.trim().to_string();
    config.api.endpoint = endpoint;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}
