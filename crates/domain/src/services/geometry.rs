//! Zone geometry containment evaluation.
//!
//! Pure functions over validated geometry: circular containment via
//! great-circle distance, polygonal containment via even-odd ray
//! casting with an explicit on-edge check so boundary points always
//! count as contained.

use crate::models::zone::{LatLng, ZoneGeometry};

/// Spherical Earth approximation radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Tolerance in degrees for collinearity in the on-edge test. Absorbs
/// floating-point noise without flipping containment on edges.
const EDGE_EPSILON_DEG: f64 = 1e-9;

/// Great-circle distance between two points in meters (haversine).
pub fn haversine_distance_m(a: LatLng, b: LatLng) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Whether a point lies within the zone geometry. Boundary points are
/// contained for both variants.
pub fn contains(geometry: &ZoneGeometry, point: LatLng) -> bool {
    contains_with_exit_margin(geometry, point, 0.0)
}

/// Containment with an additional exit-side margin in meters for
/// circular zones, used by the membership tracker to debounce boundary
/// flapping: a vehicle already inside only reads as outside once it is
/// beyond `radius + margin`. Polygonal zones ignore the margin.
pub fn contains_with_exit_margin(geometry: &ZoneGeometry, point: LatLng, margin_m: f64) -> bool {
    match geometry {
        ZoneGeometry::Circular {
            center,
            radius_meters,
        } => haversine_distance_m(*center, point) <= radius_meters + margin_m,
        ZoneGeometry::Polygonal { vertices } => point_in_polygon(vertices, point),
    }
}

/// Even-odd ray casting over the vertex sequence treated as a closed
/// loop. Points exactly on an edge are contained.
fn point_in_polygon(vertices: &[LatLng], point: LatLng) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut j = n - 1;
    for i in 0..n {
        if point_on_segment(vertices[j], vertices[i], point) {
            return true;
        }
        j = i;
    }

    let (px, py) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (vertices[i].longitude, vertices[i].latitude);
        let (xj, yj) = (vertices[j].longitude, vertices[j].latitude);

        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Whether `p` lies on the segment `a`-`b` within [`EDGE_EPSILON_DEG`].
fn point_on_segment(a: LatLng, b: LatLng, p: LatLng) -> bool {
    let cross = (b.longitude - a.longitude) * (p.latitude - a.latitude)
        - (b.latitude - a.latitude) * (p.longitude - a.longitude);
    if cross.abs() > EDGE_EPSILON_DEG {
        return false;
    }

    let dot = (p.longitude - a.longitude) * (b.longitude - a.longitude)
        + (p.latitude - a.latitude) * (b.latitude - a.latitude);
    if dot < -EDGE_EPSILON_DEG {
        return false;
    }

    let len_sq = (b.longitude - a.longitude).powi(2) + (b.latitude - a.latitude).powi(2);
    dot <= len_sq + EDGE_EPSILON_DEG
}
