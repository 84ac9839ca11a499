//! Daily aggregation of 3-hour forecast samples.

use crate::model::{DailyAggregate, ForecastSample};

/// Running accumulator for one calendar day. Wind, icon and description are
/// pinned to the day's first sample; only temperature and humidity average.
#[derive(Debug)]
struct DayBucket {
    day: String,
    count: u32,
    temp_sum: f64,
    humidity_sum: f64,
    wind_speed_kmh: f64,
    icon: String,
    description: String,
}

impl DayBucket {
    fn open(sample: &ForecastSample) -> Self {
        Self {
            day: sample.day_key().to_string(),
            count: 1,
            temp_sum: sample.temperature_c,
            humidity_sum: f64::from(sample.humidity_pct),
            wind_speed_kmh: sample.wind_speed_kmh,
            icon: sample.icon.clone(),
            description: sample.description.clone(),
        }
    }

    fn add(&mut self, sample: &ForecastSample) {
        self.count += 1;
        self.temp_sum += sample.temperature_c;
        self.humidity_sum += f64::from(sample.humidity_pct);
    }

    fn finish(self) -> DailyAggregate {
        let n = f64::from(self.count);
        DailyAggregate {
            day: self.day,
            avg_temperature_c: self.temp_sum / n,
            avg_humidity_pct: self.humidity_sum / n,
            wind_speed_kmh: self.wind_speed_kmh,
            icon: self.icon,
            description: self.description,
        }
    }
}

/// Collapse a chronological sample sequence into one aggregate per calendar
/// day, in the order days first appear in the input.
///
/// Buckets live in a `Vec` keyed by the day string, so iteration order is
/// defined by construction rather than by a map's hashing. A forecast
/// payload spans at most six distinct days; the linear key probe is fine.
///
/// Pure: no I/O, deterministic, empty in means empty out.
pub fn aggregate_daily(samples: &[ForecastSample]) -> Vec<DailyAggregate> {
    let mut buckets: Vec<DayBucket> = Vec::new();

    for sample in samples {
        let key = sample.day_key();
        match buckets.iter_mut().find(|b| b.day == key) {
            Some(bucket) => bucket.add(sample),
            None => buckets.push(DayBucket::open(sample)),
        }
    }

    buckets.into_iter().map(DayBucket::finish).collect()
}
