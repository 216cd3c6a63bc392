use std::collections::HashSet;

use crate::types::{Coordinates, DistanceResult, Place, SortKey};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// How many results the listing shows. The search itself never truncates.
pub const DISPLAY_CAP: usize = 50;

/// Great-circle distance in kilometres between two points
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can leave `a` just past 1 near the antipode
    let a = a.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Places within `radius_km` of `origin`, optionally restricted to the
/// given types, ordered by `sort_by`.
///
/// Candidates without both coordinates are skipped. A negative radius
/// yields nothing.
pub fn find_nearby(
    origin: Coordinates,
    candidates: &[Place],
    radius_km: f64,
    type_filter: &HashSet<String>,
    sort_by: SortKey,
) -> Vec<DistanceResult> {
    let mut results: Vec<DistanceResult> = candidates
        .iter()
        .filter_map(|place| place.coordinates().map(|at| (place, at)))
        .filter(|(place, _)| {
            type_filter.is_empty()
                || place
                    .type_field
                    .as_ref()
                    .is_some_and(|t| type_filter.contains(t))
        })
        .map(|(place, at)| DistanceResult {
            place: place.clone(),
            distance_km: haversine_km(origin, at),
        })
        .filter(|result| result.distance_km <= radius_km)
        .collect();

    match sort_by {
        SortKey::Distance => results.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km)),
        SortKey::Name => results.sort_by(|a, b| a.place.name.cmp(&b.place.name)),
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn place(name: &str, lat: Option<f64>, lon: Option<f64>, kind: &str) -> Place {
        Place {
            id: name.to_lowercase(),
            name: name.to_string(),
            type_field: Some(kind.to_string()),
            lat,
            lon,
            ..Default::default()
        }
    }

    fn ranchi() -> Coordinates {
        Coordinates { lat: 23.36, lon: 85.33 }
    }

    fn types(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Vec<Place> {
        vec![
            place("Hundru Falls", Some(23.284), Some(85.358), "nature"),
            place("Dassam Falls", Some(23.251), Some(85.582), "nature"),
            place("Jagannath Temple", Some(23.317), Some(85.281), "historical"),
            place("Tribal Museum", Some(23.37), Some(85.34), "cultural"),
            place("Nowhere", None, Some(85.33), "nature"),
            place("Netarhat", Some(23.471), Some(84.267), "nature"),
        ]
    }

    #[test]
    fn identical_points_are_zero_apart() {
        assert_eq!(haversine_km(ranchi(), ranchi()), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = ranchi();
        let b = Coordinates { lat: 25.0, lon: 90.0 };
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < EPSILON);
    }

    #[test]
    fn antipodal_points_stay_finite() {
        let mut worst: f64 = 0.0;
        for i in 1..9000 {
            let lat = i as f64 / 100.0;
            let here = Coordinates { lat, lon: 85.33 };
            let there = Coordinates { lat: -lat, lon: 85.33 - 180.0 };
            let d = haversine_km(here, there);
            assert!(d.is_finite(), "lat {lat} gave {d}");
            worst = worst.max(d);
        }
        assert!(worst <= std::f64::consts::PI * EARTH_RADIUS_KM + EPSILON);
    }

    #[test]
    fn antipodal_place_is_within_a_large_radius() {
        let candidates = vec![place("Far Side", Some(-23.36), Some(85.33 - 180.0), "nature")];
        let results =
            find_nearby(ranchi(), &candidates, 25_000.0, &HashSet::new(), SortKey::Distance);
        assert_eq!(results.len(), 1);
        assert!((results[0].distance_km - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1.0);
    }

    #[test]
    fn keeps_close_place_and_drops_far_one() {
        let candidates = vec![
            place("A", Some(23.37), Some(85.34), "nature"),
            place("B", Some(25.00), Some(90.00), "historical"),
        ];
        let results =
            find_nearby(ranchi(), &candidates, 50.0, &HashSet::new(), SortKey::Distance);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].place.name, "A");
        assert!((results[0].distance_km - 1.5).abs() < 0.2);

        let far = haversine_km(ranchi(), Coordinates { lat: 25.0, lon: 90.0 });
        assert!(far > 450.0 && far < 550.0, "far = {far}");
    }

    #[test]
    fn empty_candidates_give_empty_results() {
        assert!(find_nearby(ranchi(), &[], 50.0, &HashSet::new(), SortKey::Name).is_empty());
    }

    #[test]
    fn zero_radius_keeps_exact_match() {
        let candidates = vec![place("Here", Some(23.36), Some(85.33), "cultural")];
        let results =
            find_nearby(ranchi(), &candidates, 0.0, &HashSet::new(), SortKey::Distance);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].distance_km, 0.0);
    }

    #[test]
    fn negative_radius_yields_nothing() {
        let candidates = vec![place("Here", Some(23.36), Some(85.33), "cultural")];
        let results =
            find_nearby(ranchi(), &candidates, -1.0, &HashSet::new(), SortKey::Distance);
        assert!(results.is_empty());
    }

    #[test]
    fn never_exceeds_radius() {
        for radius in [0.0, 5.0, 10.0, 30.0, 120.0, 1000.0] {
            let results = find_nearby(ranchi(), &sample(), radius, &HashSet::new(), SortKey::Name);
            for result in results {
                assert!(result.distance_km <= radius + EPSILON);
            }
        }
    }

    #[test]
    fn missing_coordinates_never_appear() {
        let results =
            find_nearby(ranchi(), &sample(), 20_000.0, &HashSet::new(), SortKey::Distance);
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.place.name != "Nowhere"));
    }

    #[test]
    fn type_filter_restricts_membership() {
        let filter = types(&["historical", "cultural"]);
        let results = find_nearby(ranchi(), &sample(), 20_000.0, &filter, SortKey::Distance);
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| filter.contains(r.place.type_field.as_deref().unwrap())));
    }

    #[test]
    fn untyped_place_never_matches_a_filter() {
        let mut untyped = place("Plain", Some(23.36), Some(85.33), "");
        untyped.type_field = None;
        let nature = types(&["nature"]);
        let results = find_nearby(ranchi(), &[untyped.clone()], 10.0, &nature, SortKey::Name);
        assert!(results.is_empty());
        let results = find_nearby(ranchi(), &[untyped], 10.0, &HashSet::new(), SortKey::Name);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn sorts_by_distance() {
        let results = find_nearby(ranchi(), &sample(), 500.0, &HashSet::new(), SortKey::Distance);
        assert!(results.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
        assert_eq!(results[0].place.name, "Tribal Museum");
    }

    #[test]
    fn sorts_by_name_case_sensitively() {
        let mut candidates = sample();
        candidates.push(place("alpine meadow", Some(23.36), Some(85.33), "nature"));
        let results = find_nearby(ranchi(), &candidates, 500.0, &HashSet::new(), SortKey::Name);
        assert!(results.windows(2).all(|w| w[0].place.name <= w[1].place.name));
        assert_eq!(results.last().unwrap().place.name, "alpine meadow");
    }
}
