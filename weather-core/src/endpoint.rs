use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, str::FromStr};

use crate::error::WeatherError;

/// JSON methods exposed by WeatherAPI.com under `/v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Endpoint {
    #[default]
    Current,
    Forecast,
    Search,
    History,
    Marine,
    Future,
    TimeZone,
    Astronomy,
    IpLookup,
    Sports,
    Alerts,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "current",
            Endpoint::Forecast => "forecast",
            Endpoint::Search => "search",
            Endpoint::History => "history",
            Endpoint::Marine => "marine",
            Endpoint::Future => "future",
            Endpoint::TimeZone => "timezone",
            Endpoint::Astronomy => "astronomy",
            Endpoint::IpLookup => "ip",
            Endpoint::Sports => "sports",
            Endpoint::Alerts => "alerts",
        }
    }

    /// Path appended to the base URL, e.g. `/v1/current.json`.
    pub fn path(&self) -> String {
        format!("/v1/{}.json", self.as_str())
    }

    pub const fn all() -> &'static [Endpoint] {
        &[
            Endpoint::Current,
            Endpoint::Forecast,
            Endpoint::Search,
            Endpoint::History,
            Endpoint::Marine,
            Endpoint::Future,
            Endpoint::TimeZone,
            Endpoint::Astronomy,
            Endpoint::IpLookup,
            Endpoint::Sports,
            Endpoint::Alerts,
        ]
    }

    /// Full request URL for this endpoint under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Endpoint {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        Endpoint::all().iter().copied().find(|e| e.as_str() == lower).ok_or_else(|| {
            let supported: Vec<&str> = Endpoint::all().iter().map(Endpoint::as_str).collect();
            WeatherError::config(format!(
                "Unknown endpoint '{value}'. Supported endpoints: {}.",
                supported.join(", ")
            ))
        })
    }
}

impl TryFrom<String> for Endpoint {
    type Error = WeatherError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Endpoint::try_from(value.as_str())
    }
}

impl From<Endpoint> for String {
    fn from(value: Endpoint) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for Endpoint {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::try_from(s)
    }
}
