//! Core library for the `weather-proxy` service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The WeatherAPI.com request client and its parameter model
//! - Place/Weather records kept in an in-memory store
//!
//! It is used by the `weather-proxy` binary, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod place;

pub use client::{ApiResponse, ClientState, WeatherApiClient};
pub use config::{ApiConfig, Config, ServerConfig};
pub use endpoint::Endpoint;
pub use error::WeatherError;
pub use model::{ParamValue, Params};
pub use place::{Place, PlaceId, PlaceStore, Weather, WeatherId};
