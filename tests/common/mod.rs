#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use floatchat::domain::model::{Float, FloatStatus, Measurement, Profile};
use floatchat::{Catalog, InMemoryStore, QueryEngine};
use std::sync::Arc;

pub fn float(id: i64, lat: f64, lon: f64, status: FloatStatus) -> Float {
    Float {
        id,
        wmo_id: format!("59{:05}", id),
        latitude: lat,
        longitude: lon,
        status,
    }
}

pub fn profile(id: i64, float_id: i64, year: i32, lat: f64, lon: f64) -> Profile {
    Profile {
        id,
        float_id,
        cycle_number: id as u32,
        timestamp: Utc.with_ymd_and_hms(year, 6, 1, 12, 0, 0).unwrap(),
        latitude: lat,
        longitude: lon,
    }
}

pub fn measurement(id: i64, profile_id: i64, pressure: f64, temperature: f64, salinity: f64) -> Measurement {
    Measurement {
        id,
        profile_id,
        pressure: Some(pressure),
        temperature: Some(temperature),
        salinity: Some(salinity),
        ..Default::default()
    }
}

/// Six floats:
/// - 1, 2 in the Pacific only
/// - 3 in the Atlantic only
/// - 4 at lon -75, inside both the Pacific and Atlantic boxes
/// - 5 in the Indian Ocean (maintenance)
/// - 6 in the Southern Ocean
///
/// Nothing lies in the Arctic.
pub fn ocean_store() -> InMemoryStore {
    let floats = vec![
        float(1, 0.0, -150.0, FloatStatus::Active),
        float(2, 10.0, -120.0, FloatStatus::Inactive),
        float(3, 30.0, -40.0, FloatStatus::Active),
        float(4, 0.0, -75.0, FloatStatus::Active),
        float(5, -10.0, 80.0, FloatStatus::Maintenance),
        float(6, -65.0, -150.0, FloatStatus::Active),
    ];

    let profiles = vec![
        profile(11, 1, 2023, -1.0, -151.0),
        profile(12, 1, 2024, 0.0, -150.0),
        profile(21, 2, 2023, 10.0, -120.0),
        profile(31, 3, 2024, 30.0, -40.0),
        profile(41, 4, 2024, 0.0, -75.0),
        profile(51, 5, 2022, -10.0, 80.0),
        profile(61, 6, 2024, -65.0, -150.0),
    ];

    let measurements = vec![
        measurement(1, 11, 5.0, 20.0, 34.5),
        measurement(2, 11, 900.0, 6.0, 34.6),
        measurement(3, 12, 5.0, 22.0, 34.4),
        measurement(4, 21, 5.0, 16.0, 34.9),
        measurement(5, 31, 5.0, 18.0, 36.2),
        measurement(6, 31, 1500.0, 4.0, 35.0),
        measurement(7, 41, 5.0, 12.0, 35.5),
        measurement(8, 51, 5.0, 27.0, 35.1),
        measurement(9, 61, 5.0, 1.0, 33.9),
    ];

    InMemoryStore::new(floats, profiles, measurements)
}

pub fn engine() -> QueryEngine<InMemoryStore> {
    QueryEngine::new(Arc::new(ocean_store()), Arc::new(Catalog::builtin()))
}
