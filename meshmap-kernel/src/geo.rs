//! Small geodesy helpers.

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in metres between two `[lon, lat, ..]` positions.
///
/// Altitude is ignored.
/// The result is rounded to 0.1 m; `None` when a position has fewer than two
/// coordinates.
pub fn distance(a: &[f64], b: &[f64]) -> Option<f64> {
    let (&[lon1, lat1, ..], &[lon2, lat2, ..]) = (a, b) else {
        return None;
    };

    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Some(round_to(EARTH_RADIUS_M * c, 1))
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_same_point_is_zero() {
        let p = [-122.1471, 37.484511];
        assert_eq!(distance(&p, &p), Some(0.0));
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // one degree of latitude is ~111.2 km on a 6371 km sphere
        let d = distance(&[0.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_distance_ignores_altitude() {
        let a = distance(&[10.0, 45.0, 0.0], &[10.001, 45.0, 0.0]);
        let b = distance(&[10.0, 45.0, 900.0], &[10.001, 45.0, 3.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distance_short_position_is_none() {
        assert_eq!(distance(&[], &[0.0, 1.0]), None);
        assert_eq!(distance(&[0.0, 1.0], &[3.0]), None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456789, 6), 1.234568);
        assert_eq!(round_to(12.34, 1), 12.3);
    }
}
