//! Route and geocode caching and throttling
//!
//! Turns an expensive, rate-limited routing provider into a responsive input
//! for an interactive booking form:
//!
//! - [`cache::PersistentCache`] answers repeated lookups for 24 hours
//!   without a network call.
//! - [`throttle::RequestThrottle`] serializes provider calls and spaces them
//!   at least a second apart.
//! - [`RouteClient`] combines both in front of a [`provider::RouteProvider`]
//!   and classifies failures into [`model::RouteOutcome`] values.
//! - [`controller::RouteCalculationController`] debounces keystroke-driven
//!   input changes and publishes one current outcome.

pub mod cache;
pub mod controller;
pub mod error;
pub mod model;
pub mod provider;
pub mod response;
pub mod throttle;

mod client;

pub use client::*;
pub use response::CacheStatus;
pub use response::Response;
