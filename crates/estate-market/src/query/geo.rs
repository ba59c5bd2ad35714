use super::filter::parse_number;
use super::predicate::Predicate;
use super::schema::Field;
use super::{DropReason, Fragments, QueryParams, NEAR, RADIUS};
use crate::listings::domain::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Adds a spherical containment predicate for `near=lat,lng&radius=km`.
///
/// Partial or invalid input leaves the filter untouched.
pub(crate) fn apply(params: &QueryParams, fragments: &mut Fragments) {
    let near = params.get(NEAR);
    let radius = params.get(RADIUS);
    if near.is_none() && radius.is_none() {
        return;
    }

    match radius_predicate(near, radius) {
        Some(predicate) => fragments.push(predicate),
        None => fragments.drop_fragment(NEAR, DropReason::InvalidGeo),
    }
}

fn radius_predicate(near: Option<&str>, radius: Option<&str>) -> Option<Predicate> {
    let center = parse_point(near?)?;
    let radius_km = parse_number(radius?).filter(|km| *km > 0.0)?;

    Some(Predicate::GeoWithin {
        field: Field::Coordinates,
        center,
        radius_radians: radius_km / EARTH_RADIUS_KM,
    })
}

fn parse_point(raw: &str) -> Option<GeoPoint> {
    let (lat, lng) = raw.split_once(',')?;
    let point = GeoPoint {
        lat: parse_number(lat)?,
        lng: parse_number(lng)?,
    };
    point.is_valid().then_some(point)
}

/// Great-circle central angle between two points, in radians.
pub fn central_angle(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}
