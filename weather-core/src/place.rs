//! Place and Weather records.
//!
//! A [`Place`] owns at most one [`Weather`] and a [`Weather`] points back at
//! its place. Both records live in a [`PlaceStore`], which is the only way to
//! change the link, so the two sides can't drift apart: attaching sets both
//! references, detaching clears both, and deleting a place deletes its
//! weather.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

use crate::{
    client::ApiResponse,
    error::{Result, WeatherError},
};

pub const MAX_FIELD_LEN: usize = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PlaceId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WeatherId(u64);

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "place#{}", self.0)
    }
}

impl fmt::Display for WeatherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weather#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    id: PlaceId,
    name: String,
    country: String,
    weather: Option<WeatherId>,
}

impl Place {
    pub fn id(&self) -> PlaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn weather(&self) -> Option<WeatherId> {
        self.weather
    }
}

/// Weather observation attached to a place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weather {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<WeatherId>,
    pub temperature_c: Option<f64>,
    pub condition: Option<String>,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip)]
    place: Option<PlaceId>,
}

impl Weather {
    pub fn new(temperature_c: Option<f64>, condition: Option<String>) -> Self {
        Self { id: None, temperature_c, condition, fetched_at: Utc::now(), place: None }
    }

    /// Pick `current.temp_c` and `current.condition.text` out of an upstream response.
    pub fn from_response(response: &ApiResponse) -> Self {
        let current = response.get("current");
        let temperature_c = current.and_then(|c| c.get("temp_c")).and_then(|t| t.as_f64());
        let condition = current
            .and_then(|c| c.get("condition"))
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .map(str::to_owned);

        Self::new(temperature_c, condition)
    }

    /// `None` until the record is stored.
    pub fn id(&self) -> Option<WeatherId> {
        self.id
    }

    pub fn place(&self) -> Option<PlaceId> {
        self.place
    }
}

/// `location.name` and `location.country` of an upstream response, if both are present.
pub fn location_of(response: &ApiResponse) -> Option<(&str, &str)> {
    let location = response.get("location")?;
    let name = location.get("name")?.as_str()?;
    let country = location.get("country")?.as_str()?;
    Some((name, country))
}

fn check_field(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WeatherError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(WeatherError::validation(format!(
            "{field} must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(value.to_owned())
}

/// In-memory home of places and their weather, with auto-assigned ids.
#[derive(Debug, Default)]
pub struct PlaceStore {
    places: BTreeMap<PlaceId, Place>,
    weathers: BTreeMap<WeatherId, Weather>,
    next_place: u64,
    next_weather: u64,
}

impl PlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_place(&mut self, name: &str, country: &str) -> Result<PlaceId> {
        let name = check_field("name", name)?;
        let country = check_field("country", country)?;

        self.next_place += 1;
        let id = PlaceId(self.next_place);
        self.places.insert(id, Place { id, name, country, weather: None });

        tracing::debug!(%id, "created place");
        Ok(id)
    }

    /// Change a place's name and country. Both are checked like on creation
    /// and nothing changes if either is invalid.
    pub fn rename_place(&mut self, id: PlaceId, name: &str, country: &str) -> Result<()> {
        let name = check_field("name", name)?;
        let country = check_field("country", country)?;

        let place =
            self.places.get_mut(&id).ok_or_else(|| WeatherError::not_found(id.to_string()))?;
        place.name = name;
        place.country = country;
        Ok(())
    }

    /// Store a detached weather record and return its id.
    pub fn create_weather(&mut self, mut weather: Weather) -> WeatherId {
        self.next_weather += 1;
        let id = WeatherId(self.next_weather);
        weather.id = Some(id);
        weather.place = None;
        self.weathers.insert(id, weather);
        id
    }

    pub fn place(&self, id: PlaceId) -> Result<&Place> {
        self.places.get(&id).ok_or_else(|| WeatherError::not_found(id.to_string()))
    }

    pub fn weather(&self, id: WeatherId) -> Result<&Weather> {
        self.weathers.get(&id).ok_or_else(|| WeatherError::not_found(id.to_string()))
    }

    /// Weather currently attached to `place`, if any.
    pub fn weather_of(&self, place: PlaceId) -> Result<Option<&Weather>> {
        let place = self.place(place)?;
        Ok(place.weather.and_then(|w| self.weathers.get(&w)))
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.values()
    }

    pub fn find_place(&self, name: &str, country: &str) -> Option<&Place> {
        self.places.values().find(|p| p.name == name.trim() && p.country == country.trim())
    }

    /// Attach `weather` to `place`, or detach with `None`.
    ///
    /// The place's previous weather loses its back-reference, and a weather
    /// that belonged to another place is taken away from it.
    pub fn set_weather(&mut self, place: PlaceId, weather: Option<WeatherId>) -> Result<()> {
        self.place(place)?;
        if let Some(w) = weather {
            self.weather(w)?;
        }

        let previous = self.places.get(&place).and_then(|p| p.weather);
        if previous == weather {
            return Ok(());
        }

        if let Some(old) = previous.and_then(|w| self.weathers.get_mut(&w)) {
            old.place = None;
        }

        if let Some(w) = weather {
            let old_owner = self.weathers.get(&w).and_then(|w| w.place);
            if let Some(other) = old_owner.and_then(|p| self.places.get_mut(&p)) {
                other.weather = None;
            }
            if let Some(record) = self.weathers.get_mut(&w) {
                record.place = Some(place);
            }
        }

        if let Some(p) = self.places.get_mut(&place) {
            p.weather = weather;
        }

        Ok(())
    }

    /// Same link as [`PlaceStore::set_weather`], driven from the weather side.
    pub fn set_place(&mut self, weather: WeatherId, place: Option<PlaceId>) -> Result<()> {
        let current = self.weather(weather)?.place;
        match place {
            Some(p) => self.set_weather(p, Some(weather)),
            None => match current {
                Some(p) => self.set_weather(p, None),
                None => Ok(()),
            },
        }
    }

    /// Remove a place together with its weather.
    pub fn delete_place(&mut self, id: PlaceId) -> Result<Place> {
        let place = self.places.remove(&id).ok_or_else(|| WeatherError::not_found(id.to_string()))?;
        if let Some(w) = place.weather {
            self.weathers.remove(&w);
        }

        tracing::debug!(%id, cascaded = place.weather.is_some(), "deleted place");
        Ok(place)
    }

    /// Remove a weather record, clearing its place's reference.
    pub fn delete_weather(&mut self, id: WeatherId) -> Result<Weather> {
        let weather =
            self.weathers.remove(&id).ok_or_else(|| WeatherError::not_found(id.to_string()))?;
        if let Some(p) = weather.place.and_then(|p| self.places.get_mut(&p)) {
            p.weather = None;
        }
        Ok(weather)
    }

    /// Find or create the place named in `response` and replace its weather with
    /// a fresh record built from the same response.
    pub fn record_response(&mut self, response: &ApiResponse) -> Result<Option<PlaceId>> {
        let Some((name, country)) = location_of(response) else {
            return Ok(None);
        };

        let place = match self.find_place(name, country) {
            Some(p) => p.id,
            None => self.create_place(name, country)?,
        };

        let previous = self.place(place)?.weather;
        let weather = self.create_weather(Weather::from_response(response));
        self.set_weather(place, Some(weather))?;
        if let Some(old) = previous {
            self.delete_weather(old)?;
        }

        Ok(Some(place))
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> ApiResponse {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("test response must be an object"),
        }
    }

    #[test]
    fn new_place_has_no_weather() {
        let mut store = PlaceStore::new();
        let p = store.create_place("Paris", "France").unwrap();

        let place = store.place(p).unwrap();
        assert_eq!(place.name(), "Paris");
        assert_eq!(place.country(), "France");
        assert_eq!(place.weather(), None);
    }

    #[test]
    fn ids_are_assigned_in_order() {
        let mut store = PlaceStore::new();
        let a = store.create_place("Paris", "France").unwrap();
        let b = store.create_place("Oslo", "Norway").unwrap();

        assert!(a < b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn field_length_is_limited_to_70_chars() {
        let mut store = PlaceStore::new();

        assert!(store.create_place(&"é".repeat(70), "France").is_ok());
        let err = store.create_place(&"x".repeat(71), "France").unwrap_err();
        assert!(matches!(err, WeatherError::Validation(_)));
        assert!(store.create_place("Paris", "").is_err());
    }

    #[test]
    fn rename_place_updates_fields_and_keeps_weather() {
        let mut store = PlaceStore::new();
        let p = store.create_place("Pariss", "Frnace").unwrap();
        let w = store.create_weather(Weather::new(Some(21.0), None));
        store.set_weather(p, Some(w)).unwrap();

        store.rename_place(p, " Paris ", "France").unwrap();

        let place = store.place(p).unwrap();
        assert_eq!(place.name(), "Paris");
        assert_eq!(place.country(), "France");
        assert_eq!(place.weather(), Some(w));
        assert_eq!(store.find_place("Paris", "France").map(Place::id), Some(p));
    }

    #[test]
    fn rename_place_rejects_invalid_fields_without_partial_update() {
        let mut store = PlaceStore::new();
        let p = store.create_place("Paris", "France").unwrap();

        let err = store.rename_place(p, "Lyon", &"x".repeat(71)).unwrap_err();
        assert!(matches!(err, WeatherError::Validation(_)));
        assert_eq!(store.place(p).unwrap().name(), "Paris");

        assert!(matches!(store.rename_place(PlaceId(99), "Lyon", "France"), Err(WeatherError::NotFound(_))));
    }

    #[test]
    fn attach_and_detach_keep_both_sides_in_sync() {
        let mut store = PlaceStore::new();
        let p = store.create_place("Paris", "France").unwrap();
        let w = store.create_weather(Weather::new(Some(21.0), None));

        store.set_weather(p, Some(w)).unwrap();
        assert_eq!(store.weather(w).unwrap().place(), Some(p));
        assert_eq!(store.place(p).unwrap().weather(), Some(w));

        store.set_weather(p, None).unwrap();
        assert_eq!(store.weather(w).unwrap().place(), None);
        assert_eq!(store.place(p).unwrap().weather(), None);
    }

    #[test]
    fn replacing_weather_releases_the_old_record() {
        let mut store = PlaceStore::new();
        let p = store.create_place("Paris", "France").unwrap();
        let w1 = store.create_weather(Weather::new(Some(10.0), None));
        let w2 = store.create_weather(Weather::new(Some(12.0), None));

        store.set_weather(p, Some(w1)).unwrap();
        store.set_weather(p, Some(w2)).unwrap();

        assert_eq!(store.weather(w1).unwrap().place(), None);
        assert_eq!(store.weather(w2).unwrap().place(), Some(p));
    }

    #[test]
    fn moving_weather_to_another_place_clears_the_first() {
        let mut store = PlaceStore::new();
        let paris = store.create_place("Paris", "France").unwrap();
        let oslo = store.create_place("Oslo", "Norway").unwrap();
        let w = store.create_weather(Weather::new(None, Some("Sunny".into())));

        store.set_weather(paris, Some(w)).unwrap();
        store.set_place(w, Some(oslo)).unwrap();

        assert_eq!(store.place(paris).unwrap().weather(), None);
        assert_eq!(store.place(oslo).unwrap().weather(), Some(w));
        assert_eq!(store.weather(w).unwrap().place(), Some(oslo));

        store.set_place(w, None).unwrap();
        assert_eq!(store.place(oslo).unwrap().weather(), None);
    }

    #[test]
    fn deleting_place_cascades_to_weather() {
        let mut store = PlaceStore::new();
        let p = store.create_place("Paris", "France").unwrap();
        let w = store.create_weather(Weather::new(Some(21.0), None));
        store.set_weather(p, Some(w)).unwrap();

        store.delete_place(p).unwrap();

        assert!(matches!(store.place(p), Err(WeatherError::NotFound(_))));
        assert!(matches!(store.weather(w), Err(WeatherError::NotFound(_))));
    }

    #[test]
    fn deleting_weather_clears_place_link() {
        let mut store = PlaceStore::new();
        let p = store.create_place("Paris", "France").unwrap();
        let w = store.create_weather(Weather::new(Some(21.0), None));
        store.set_weather(p, Some(w)).unwrap();

        store.delete_weather(w).unwrap();
        assert_eq!(store.place(p).unwrap().weather(), None);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut store = PlaceStore::new();
        let p = store.create_place("Paris", "France").unwrap();
        let w = store.create_weather(Weather::new(None, None));
        store.delete_weather(w).unwrap();

        assert!(matches!(store.set_weather(p, Some(w)), Err(WeatherError::NotFound(_))));
        assert!(store.delete_place(PlaceId(99)).is_err());
    }

    #[test]
    fn weather_from_response_reads_current_block() {
        let resp = response(json!({
            "location": {"name": "Paris", "country": "France"},
            "current": {"temp_c": 21, "condition": {"text": "Partly cloudy"}}
        }));

        let weather = Weather::from_response(&resp);
        assert_eq!(weather.temperature_c, Some(21.0));
        assert_eq!(weather.condition.as_deref(), Some("Partly cloudy"));
        assert_eq!(location_of(&resp), Some(("Paris", "France")));

        let empty = Weather::from_response(&ApiResponse::new());
        assert_eq!(empty.temperature_c, None);
        assert_eq!(empty.condition, None);
    }

    #[test]
    fn record_response_upserts_place_and_replaces_weather() {
        let mut store = PlaceStore::new();
        let first = response(json!({
            "location": {"name": "Paris", "country": "France"},
            "current": {"temp_c": 18.5}
        }));
        let second = response(json!({
            "location": {"name": "Paris", "country": "France"},
            "current": {"temp_c": 20.0}
        }));

        let p1 = store.record_response(&first).unwrap().unwrap();
        let old = store.place(p1).unwrap().weather().unwrap();
        let p2 = store.record_response(&second).unwrap().unwrap();

        assert_eq!(p1, p2);
        assert_eq!(store.len(), 1);
        assert!(store.weather(old).is_err());
        let current = store.weather_of(p1).unwrap().unwrap();
        assert_eq!(current.temperature_c, Some(20.0));
        assert_eq!(current.place(), Some(p1));
    }

    #[test]
    fn record_response_without_location_stores_nothing() {
        let mut store = PlaceStore::new();
        let resp = response(json!({"error": {"code": 1006}}));

        assert_eq!(store.record_response(&resp).unwrap(), None);
        assert!(store.is_empty());
    }
}
