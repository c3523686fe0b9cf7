use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Parameter names understood by WeatherAPI.com.
///
/// The client does not check names against this list; it only exists so
/// callers don't have to spell them out.
pub mod keys {
    pub const KEY: &str = "key";
    pub const Q: &str = "q";
    pub const DAYS: &str = "days";
    pub const DT: &str = "dt";
    pub const UNIXDT: &str = "unixdt";
    pub const END_DT: &str = "end_dt";
    pub const UNIXEND_DT: &str = "unixend_dt";
    pub const HOUR: &str = "hour";
    pub const ALERTS: &str = "alerts";
    pub const AQI: &str = "aqi";
    pub const TIDES: &str = "tides";
    pub const TP: &str = "tp";
    pub const CURRENT_FIELDS: &str = "current_fields";
    pub const DAY_FIELDS: &str = "day_fields";
    pub const HOUR_FIELDS: &str = "hour_fields";
    pub const LANG: &str = "lang";
}

/// A single request parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl FromStr for ParamValue {
    type Err = std::convert::Infallible;

    /// Integers in canonical form become `Int`; anything else, including
    /// `02134`, `+33` and `-0`, stays text exactly as given.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Ok(ParamValue::Int(n)),
            _ => Ok(ParamValue::Text(s.to_owned())),
        }
    }
}

/// Named request parameters, serialised as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse a `name=value` pair as typed on the command line.
    pub fn parse_pair(pair: &str) -> anyhow::Result<(String, ParamValue)> {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected name=value, got '{pair}'"))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow::anyhow!("Parameter name is empty in '{pair}'"));
        }

        let value = match value.parse::<ParamValue>() {
            Ok(v) => v,
            Err(never) => match never {},
        };

        Ok((name.to_owned(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialises_as_flat_object_with_native_types() {
        let params = Params::new().with(keys::Q, "Paris").with(keys::DAYS, 3_i64);

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, json!({"q": "Paris", "days": 3}));
    }

    #[test]
    fn deserialises_mixed_values() {
        let params: Params = serde_json::from_value(json!({"q": "Paris", "hour": 14})).unwrap();

        assert_eq!(params.get("q"), Some(&ParamValue::Text("Paris".into())));
        assert_eq!(params.get("hour"), Some(&ParamValue::Int(14)));
    }

    #[test]
    fn parse_pair_detects_integers() {
        let (name, value) = Params::parse_pair("days=5").unwrap();
        assert_eq!(name, "days");
        assert_eq!(value, ParamValue::Int(5));

        let (_, value) = Params::parse_pair("q=48.8567,2.3508").unwrap();
        assert_eq!(value, ParamValue::Text("48.8567,2.3508".into()));

        let (_, value) = Params::parse_pair("lang=").unwrap();
        assert_eq!(value, ParamValue::Text(String::new()));
    }

    #[test]
    fn parse_pair_keeps_non_canonical_numbers_as_text() {
        let (_, value) = Params::parse_pair("q=02134").unwrap();
        assert_eq!(value, ParamValue::Text("02134".into()));

        for raw in ["+33", "-0", "007"] {
            assert_eq!(raw.parse::<ParamValue>().unwrap(), ParamValue::Text(raw.into()));
        }
        assert_eq!("-12".parse::<ParamValue>().unwrap(), ParamValue::Int(-12));
        assert_eq!("0".parse::<ParamValue>().unwrap(), ParamValue::Int(0));
    }

    #[test]
    fn parse_pair_rejects_malformed_input() {
        assert!(Params::parse_pair("no-equals-sign").is_err());
        assert!(Params::parse_pair("=value").is_err());
    }

    #[test]
    fn collects_from_pairs() {
        let params: Params = [("key", "abc"), ("q", "Paris")].into_iter().collect();

        assert_eq!(params.len(), 2);
        assert!(params.contains("key"));
        assert!(!params.contains("days"));
        assert_eq!(params.get("key").map(ToString::to_string), Some("abc".to_string()));
    }
}
