//! Route results and outcomes

use serde::Deserialize;
use serde::Serialize;

use crate::error::ApiError;
use crate::provider::ProviderRoute;

/// A fully-formed route between origin and destination.
///
/// Only ever built from a successful provider answer with at least one
/// route, and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Total distance, human-readable (e.g. `58 km`).
    pub distance_text: String,
    /// Total duration, human-readable (e.g. `45 mins`).
    pub duration_text: String,
    /// Total distance in meters.
    pub distance_meters: u64,
    /// Total duration in seconds.
    pub duration_seconds: u64,
    /// Visiting order of the stops, as indices into the canonical (sorted)
    /// stop list.
    pub waypoint_order: Vec<usize>,
    /// Stop addresses in visiting order.
    pub ordered_stops: Vec<String>,
    /// Encoded overview polyline. Opaque to this crate.
    pub polyline: String,
}

impl RouteResult {
    /// The zero-distance result used for open-ended bookings.
    pub fn empty() -> Self {
        Self::from_totals(0, 0)
    }

    /// Builds a result from totals, without waypoints or geometry.
    pub fn from_totals(distance_meters: u64, duration_seconds: u64) -> Self {
        Self {
            distance_text: format_distance(distance_meters),
            duration_text: format_duration(duration_seconds),
            distance_meters,
            duration_seconds,
            waypoint_order: Vec::new(),
            ordered_stops: Vec::new(),
            polyline: String::new(),
        }
    }

    /// Builds a result from a provider route.
    ///
    /// `stops` must be the waypoint list the route was requested with.
    /// Waypoint indices outside of it are ignored.
    pub fn from_provider_route(route: &ProviderRoute, stops: &[String]) -> Self {
        let distance_meters = route.legs.iter().map(|leg| leg.distance_meters).sum();
        let duration_seconds = route.legs.iter().map(|leg| leg.duration_seconds).sum();

        let waypoint_order = if route.waypoint_order.is_empty() {
            (0..stops.len()).collect()
        } else {
            route.waypoint_order.clone()
        };
        let ordered_stops = waypoint_order
            .iter()
            .filter_map(|&index| stops.get(index).cloned())
            .collect();

        Self {
            waypoint_order,
            ordered_stops,
            polyline: route.polyline.clone(),
            ..Self::from_totals(distance_meters, duration_seconds)
        }
    }
}

/// Outcome of a route resolution, as consumed by the UI.
///
/// Exactly one variant is active for a given request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A route was found.
    Success(RouteResult),
    /// The provider understood the request but no drivable path exists.
    NoRouteFound,
    /// The provider call failed.
    ApiError(ApiError),
    /// The provider call did not complete in time.
    Timeout,
}

impl RouteOutcome {
    /// Returns `true` for [`RouteOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the route for a successful outcome.
    pub fn route(&self) -> Option<&RouteResult> {
        match self {
            Self::Success(route) => Some(route),
            _ => None,
        }
    }

    /// Returns a user-facing message for unsuccessful outcomes.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::NoRouteFound => {
                Some("No route could be found between these addresses".to_string())
            }
            Self::ApiError(err) => Some(err.to_string()),
            Self::Timeout => Some("The routing service did not respond in time".to_string()),
        }
    }
}

/// Formats a distance the way the routing UI displays it.
///
/// Below 1 km in meters, below 10 km with one decimal, otherwise whole km.
pub fn format_distance(meters: u64) -> String {
    if meters < 1_000 {
        format!("{} m", meters)
    } else if meters < 10_000 {
        format!("{:.1} km", meters as f64 / 1_000.0)
    } else {
        format!("{} km", (meters + 500) / 1_000)
    }
}

/// Formats a duration rounded to the nearest minute.
pub fn format_duration(seconds: u64) -> String {
    let minutes = (seconds + 30) / 60;
    let hours = minutes / 60;
    let minutes = minutes % 60;

    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("{} {}", n, unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    match (hours, minutes) {
        (0, m) => plural(m, "min"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "min")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RouteLeg;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0), "0 m");
        assert_eq!(format_distance(850), "850 m");
        assert_eq!(format_distance(4_240), "4.2 km");
        assert_eq!(format_distance(57_800), "58 km");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0 mins");
        assert_eq!(format_duration(60), "1 min");
        assert_eq!(format_duration(45 * 60 + 10), "45 mins");
        assert_eq!(format_duration(3600), "1 hour");
        assert_eq!(format_duration(3600 + 5 * 60), "1 hour 5 mins");
        assert_eq!(format_duration(2 * 3600 + 60), "2 hours 1 min");
    }

    #[test]
    fn test_from_provider_route_sums_legs_and_orders_stops() {
        let route = ProviderRoute {
            legs: vec![
                RouteLeg {
                    distance_meters: 20_000,
                    duration_seconds: 900,
                },
                RouteLeg {
                    distance_meters: 18_000,
                    duration_seconds: 800,
                },
                RouteLeg {
                    distance_meters: 20_000,
                    duration_seconds: 1_000,
                },
            ],
            waypoint_order: vec![1, 0],
            polyline: "encoded".to_string(),
        };
        let stops = vec!["Baar".to_string(), "Zug".to_string()];

        let result = RouteResult::from_provider_route(&route, &stops);
        assert_eq!(result.distance_meters, 58_000);
        assert_eq!(result.distance_text, "58 km");
        assert_eq!(result.duration_seconds, 2_700);
        assert_eq!(result.duration_text, "45 mins");
        assert_eq!(result.ordered_stops, vec!["Zug", "Baar"]);
        assert_eq!(result.polyline, "encoded");
    }

    #[test]
    fn test_outcome_messages() {
        assert!(RouteOutcome::Success(RouteResult::empty()).error_message().is_none());
        assert!(RouteOutcome::NoRouteFound.error_message().is_some());
        let outcome = RouteOutcome::ApiError(ApiError::RateLimited {
            message: "quota".into(),
        });
        assert!(outcome.error_message().is_some_and(|m| m.contains("try again")));
    }
}
