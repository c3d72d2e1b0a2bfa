use crate::core::stats::StatAccumulator;
use crate::domain::model::{
    Float, GeoExtent, Measurement, Profile, VariableId, VariableStatistic,
};
use crate::domain::ports::{FloatFilter, FloatStore, MeasurementScope};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Read-only, in-process float store.
///
/// Aggregations stream over the selected profiles and measurements, keeping
/// one [`StatAccumulator`] per float and variable and merging the partials at
/// the end. No measurement rows are copied out.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    floats: Vec<Float>,
    profiles: Vec<Profile>,
    measurements: Vec<Measurement>,
    profiles_by_float: HashMap<i64, Vec<usize>>,
    measurements_by_profile: HashMap<i64, Vec<usize>>,
}

impl InMemoryStore {
    pub fn new(floats: Vec<Float>, profiles: Vec<Profile>, measurements: Vec<Measurement>) -> Self {
        let mut profiles_by_float: HashMap<i64, Vec<usize>> = HashMap::new();
        for (index, profile) in profiles.iter().enumerate() {
            profiles_by_float
                .entry(profile.float_id)
                .or_default()
                .push(index);
        }

        let mut measurements_by_profile: HashMap<i64, Vec<usize>> = HashMap::new();
        for (index, measurement) in measurements.iter().enumerate() {
            measurements_by_profile
                .entry(measurement.profile_id)
                .or_default()
                .push(index);
        }

        tracing::debug!(
            "Indexed {} floats, {} profiles, {} measurements",
            floats.len(),
            profiles.len(),
            measurements.len()
        );

        Self {
            floats,
            profiles,
            measurements,
            profiles_by_float,
            measurements_by_profile,
        }
    }

    pub fn float_count(&self) -> usize {
        self.floats.len()
    }

    fn profiles_in_scope<'a>(
        &'a self,
        float_id: i64,
        scope: &'a MeasurementScope,
    ) -> impl Iterator<Item = &'a Profile> + 'a {
        self.profiles_by_float
            .get(&float_id)
            .into_iter()
            .flatten()
            .map(move |&index| &self.profiles[index])
            .filter(move |profile| {
                scope
                    .date_range
                    .map(|range| range.contains(&profile.timestamp))
                    .unwrap_or(true)
            })
    }

    fn measurements_in_scope<'a>(
        &'a self,
        profile_id: i64,
        scope: &'a MeasurementScope,
    ) -> impl Iterator<Item = &'a Measurement> + 'a {
        self.measurements_by_profile
            .get(&profile_id)
            .into_iter()
            .flatten()
            .map(move |&index| &self.measurements[index])
            .filter(move |measurement| match scope.depth_range {
                None => true,
                Some(range) => match (measurement.depth, measurement.pressure) {
                    (Some(depth), _) => depth >= range.min_m && depth <= range.max_m,
                    (None, Some(pressure)) => range.contains_pressure(pressure),
                    (None, None) => false,
                },
            })
    }

    fn unique_ids(float_ids: &[i64]) -> Vec<i64> {
        let mut seen = HashSet::new();
        float_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

#[async_trait]
impl FloatStore for InMemoryStore {
    async fn list_floats(&self, filter: &FloatFilter) -> Result<Vec<Float>> {
        let floats = self
            .floats
            .iter()
            .filter(|float| {
                filter
                    .bbox
                    .map(|bbox| bbox.contains(float.latitude, float.longitude))
                    .unwrap_or(true)
                    && filter.status.map(|s| s == float.status).unwrap_or(true)
                    && filter
                        .wmo_id
                        .as_deref()
                        .map(|wmo| wmo == float.wmo_id)
                        .unwrap_or(true)
                    && filter
                        .date_range
                        .map(|range| {
                            let scope = MeasurementScope {
                                date_range: Some(range),
                                depth_range: None,
                            };
                            let found = self.profiles_in_scope(float.id, &scope).next().is_some();
                            found
                        })
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        Ok(floats)
    }

    async fn profile_count(&self, float_ids: &[i64], scope: &MeasurementScope) -> Result<u64> {
        Ok(Self::unique_ids(float_ids)
            .into_iter()
            .map(|id| self.profiles_in_scope(id, scope).count() as u64)
            .sum())
    }

    async fn measurement_count(&self, float_ids: &[i64], scope: &MeasurementScope) -> Result<u64> {
        let mut total = 0u64;
        for id in Self::unique_ids(float_ids) {
            for profile in self.profiles_in_scope(id, scope) {
                total += self.measurements_in_scope(profile.id, scope).count() as u64;
            }
        }
        Ok(total)
    }

    async fn variable_statistics(
        &self,
        float_ids: &[i64],
        variables: &[VariableId],
        scope: &MeasurementScope,
    ) -> Result<BTreeMap<VariableId, VariableStatistic>> {
        let mut totals: BTreeMap<VariableId, StatAccumulator> = variables
            .iter()
            .map(|id| (*id, StatAccumulator::new()))
            .collect();

        for id in Self::unique_ids(float_ids) {
            // 每個浮標先累加成部分結果，最後再合併
            let mut partials: BTreeMap<VariableId, StatAccumulator> = BTreeMap::new();
            for profile in self.profiles_in_scope(id, scope) {
                for measurement in self.measurements_in_scope(profile.id, scope) {
                    for variable in variables {
                        partials
                            .entry(*variable)
                            .or_default()
                            .push_opt(measurement.value(*variable));
                    }
                }
            }

            for (variable, partial) in partials {
                totals.entry(variable).or_default().merge(&partial);
            }
        }

        Ok(totals
            .into_iter()
            .map(|(id, acc)| (id, acc.finish()))
            .collect())
    }

    async fn geographic_extent(
        &self,
        float_ids: &[i64],
        scope: &MeasurementScope,
    ) -> Result<Option<GeoExtent>> {
        let mut extent: Option<GeoExtent> = None;

        for id in Self::unique_ids(float_ids) {
            for profile in self.profiles_in_scope(id, scope) {
                let (lat, lon) = (profile.latitude, profile.longitude);
                if !lat.is_finite() || !lon.is_finite() {
                    continue;
                }
                extent = Some(match extent {
                    None => GeoExtent {
                        min_lat: lat,
                        max_lat: lat,
                        min_lon: lon,
                        max_lon: lon,
                    },
                    Some(e) => GeoExtent {
                        min_lat: e.min_lat.min(lat),
                        max_lat: e.max_lat.max(lat),
                        min_lon: e.min_lon.min(lon),
                        max_lon: e.max_lon.max(lon),
                    },
                });
            }
        }

        Ok(extent)
    }

    async fn date_range(
        &self,
        float_ids: &[i64],
        scope: &MeasurementScope,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let mut range: Option<(DateTime<Utc>, DateTime<Utc>)> = None;

        for id in Self::unique_ids(float_ids) {
            for profile in self.profiles_in_scope(id, scope) {
                let ts = profile.timestamp;
                range = Some(match range {
                    None => (ts, ts),
                    Some((start, end)) => (start.min(ts), end.max(ts)),
                });
            }
        }

        Ok(range)
    }
}
