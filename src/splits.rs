//! Per-kilometer split aggregation
//!
//! Buckets a cumulative telemetry series into integer kilometer bins and
//! derives the split pace of each bin by differencing cumulative distance and
//! duration between consecutive bucket boundaries. Pace that cannot be
//! computed (zero or negative interval distance, non-finite quotient) is
//! carried as `None` so downstream means and minimum searches never see
//! `NaN` or infinity.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::error::{Result, RunSplitsError};
use crate::models::{RawSample, SplitRecord, METERS_PER_KM, SECONDS_PER_MINUTE};

/// Default number of leading kilometers ignored when looking for the fastest split
pub const DEFAULT_WARMUP_KM: i64 = 2;

/// Running state for one kilometer bucket
#[derive(Debug, Default)]
struct Bucket {
    hr_sum: f64,
    hr_count: usize,
    boundary: Option<RawSample>,
}

impl Bucket {
    fn push(&mut self, sample: &RawSample) {
        if let Some(hr) = sample.heart_rate.filter(|hr| hr.is_finite()) {
            self.hr_sum += hr;
            self.hr_count += 1;
        }
        self.boundary = Some(*sample);
    }

    fn mean_heart_rate(&self) -> Option<f64> {
        (self.hr_count > 0).then(|| self.hr_sum / self.hr_count as f64)
    }
}

/// Converts raw samples into per-kilometer split records
pub struct SplitAggregator;

impl SplitAggregator {
    /// Aggregate an ordered sample series into ascending per-kilometer splits.
    ///
    /// Bucket `k` holds every sample with `floor(distance / 1000) == k`. The
    /// last sample of a bucket (in input order) is its boundary; interval
    /// distance and duration are measured from the previous bucket's boundary,
    /// starting from zero for the first bucket.
    ///
    /// Out-of-order input is not rejected. Samples are still bucketed purely
    /// by their distance key, which can yield negative intervals; those get an
    /// undefined pace.
    pub fn aggregate(samples: &[RawSample]) -> Result<Vec<SplitRecord>> {
        if samples.is_empty() {
            return Err(RunSplitsError::InvalidInput(
                "sample sequence is empty".to_string(),
            ));
        }

        let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();
        for (i, sample) in samples.iter().enumerate() {
            Self::validate(i, sample)?;
            buckets.entry(sample.km_index()).or_default().push(sample);
        }

        let mut prev_distance = 0.0;
        let mut prev_duration = 0.0;
        let mut records = Vec::with_capacity(buckets.len());

        for (km_index, bucket) in &buckets {
            let Some(boundary) = bucket.boundary else {
                continue;
            };

            let interval_distance_km =
                (boundary.cumulative_distance_meters - prev_distance) / METERS_PER_KM;
            let interval_duration_minutes =
                (boundary.cumulative_duration_seconds - prev_duration) / SECONDS_PER_MINUTE;
            let pace_min_per_km = split_pace(interval_duration_minutes, interval_distance_km);

            if pace_min_per_km.is_none() {
                trace!(
                    km_index,
                    interval_distance_km,
                    interval_duration_minutes,
                    "Split pace undefined"
                );
            }

            records.push(SplitRecord {
                km_index: *km_index,
                mean_heart_rate: bucket.mean_heart_rate(),
                interval_distance_km,
                interval_duration_minutes,
                pace_min_per_km,
                boundary_distance_meters: boundary.cumulative_distance_meters,
                boundary_duration_seconds: boundary.cumulative_duration_seconds,
            });

            prev_distance = boundary.cumulative_distance_meters;
            prev_duration = boundary.cumulative_duration_seconds;
        }

        debug!(
            samples = samples.len(),
            splits = records.len(),
            "Aggregated samples into kilometer splits"
        );

        Ok(records)
    }

    fn validate(index: usize, sample: &RawSample) -> Result<()> {
        if !sample.cumulative_distance_meters.is_finite() {
            return Err(RunSplitsError::InvalidInput(format!(
                "sample {} is missing cumulative distance",
                index
            )));
        }
        if !sample.cumulative_duration_seconds.is_finite() {
            return Err(RunSplitsError::InvalidInput(format!(
                "sample {} is missing cumulative duration",
                index
            )));
        }
        Ok(())
    }
}

/// Minutes per kilometer, or `None` when the interval distance cannot divide
fn split_pace(duration_minutes: f64, distance_km: f64) -> Option<f64> {
    if !(distance_km.is_finite() && distance_km > 0.0) {
        return None;
    }

    let pace = duration_minutes / distance_km;
    pace.is_finite().then_some(pace)
}

/// Validity and warm-up policy applied to splits before further analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitFilter {
    /// Lowest kilometer index that is eligible
    pub min_index: i64,
}

impl SplitFilter {
    pub fn new(min_index: i64) -> Self {
        Self { min_index }
    }

    /// Whether a split has a usable pace and lies past the warm-up
    pub fn accepts(&self, record: &SplitRecord) -> bool {
        let valid_pace = record
            .pace_min_per_km
            .is_some_and(|pace| pace.is_finite() && pace > 0.0);

        valid_pace && record.km_index >= self.min_index
    }

    /// Keep only accepted splits, preserving order
    pub fn apply(&self, records: &[SplitRecord]) -> Vec<SplitRecord> {
        records
            .iter()
            .filter(|record| self.accepts(record))
            .cloned()
            .collect()
    }
}

impl Default for SplitFilter {
    fn default() -> Self {
        Self::new(DEFAULT_WARMUP_KM)
    }
}

/// Fastest split at or after `min_index`; ties go to the lowest kilometer
pub fn fastest_split(records: &[SplitRecord], min_index: i64) -> Option<SplitRecord> {
    let filter = SplitFilter::new(min_index);

    records
        .iter()
        .filter(|record| filter.accepts(record))
        .filter_map(|record| record.pace_min_per_km.map(|pace| (pace, record)))
        .min_by(|(a_pace, a), (b_pace, b)| {
            a_pace
                .total_cmp(b_pace)
                .then_with(|| a.km_index.cmp(&b.km_index))
        })
        .map(|(_, record)| record.clone())
}
