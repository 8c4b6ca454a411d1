//! Builder pattern for creating SenML packs

use crate::{Pack, Record};

/// Builder for creating SenML packs with a fluent API
///
/// Base fields are attached to the first record of the built pack. When no record was
/// added, the pack holds a single record that only declares the base fields.
#[derive(Debug, Default)]
pub struct PackBuilder {
    base_name: Option<String>,
    base_time: Option<f64>,
    base_unit: Option<String>,
    base_version: Option<i32>,
    records: Vec<Record>,
}

impl PackBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base name for all records
    pub fn base_name<S: Into<String>>(mut self, name: S) -> Self {
        self.base_name = Some(name.into());
        self
    }

    /// Set the base time for all records
    pub fn base_time(mut self, time: f64) -> Self {
        self.base_time = Some(time);
        self
    }

    /// Set the base unit for all records
    pub fn base_unit<S: Into<String>>(mut self, unit: S) -> Self {
        self.base_unit = Some(unit.into());
        self
    }

    pub fn base_version(mut self, version: i32) -> Self {
        self.base_version = Some(version);
        self
    }

    /// Add a record with a numeric value
    pub fn add_value<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.records.push(Record::with_value(name, value));
        self
    }

    /// Add a record with a string value
    pub fn add_string_value<S: Into<String>, V: Into<String>>(mut self, name: S, value: V) -> Self {
        self.records.push(Record::with_string_value(name, value));
        self
    }

    /// Add a record with a boolean value
    pub fn add_bool_value<S: Into<String>>(mut self, name: S, value: bool) -> Self {
        self.records.push(Record::with_bool_value(name, value));
        self
    }

    /// Add a record with binary data
    pub fn add_data_value<S: Into<String>>(mut self, name: S, data: &[u8]) -> Self {
        self.records.push(Record::with_data_value(name, data));
        self
    }

    /// Add a measurement with timestamp
    pub fn add_measurement<S: Into<String>>(mut self, name: S, value: f64, time: f64) -> Self {
        self.records
            .push(Record::with_value(name, value).with_time(time));
        self
    }

    /// Add a measurement with unit and timestamp
    pub fn add_measurement_with_unit<S: Into<String>, U: Into<String>>(
        mut self,
        name: S,
        value: f64,
        unit: U,
        time: f64,
    ) -> Self {
        self.records.push(
            Record::with_value(name, value)
                .with_unit(unit)
                .with_time(time),
        );
        self
    }

    /// Add a sum measurement
    pub fn add_sum<S: Into<String>>(mut self, name: S, sum: f64, time: f64) -> Self {
        self.records
            .push(Record::new().with_name(name).with_sum(sum).with_time(time));
        self
    }

    /// Add an existing record
    pub fn add_record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Add multiple records at once
    pub fn add_records<I>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        self.records.extend(records);
        self
    }

    /// Build the SenML pack
    pub fn build(self) -> Pack {
        let mut records = self.records;
        if records.is_empty() && (self.base_name.is_some()
            || self.base_time.is_some()
            || self.base_unit.is_some()
            || self.base_version.is_some())
        {
            records.push(Record::new());
        }

        if let Some(first) = records.first_mut() {
            if let Some(bn) = self.base_name {
                first.base_name = bn;
            }
            if let Some(bt) = self.base_time {
                first.base_time = bt;
            }
            if let Some(bu) = self.base_unit {
                first.base_unit = bu;
            }
            if let Some(bver) = self.base_version {
                first.base_version = bver;
            }
        }

        Pack::from(records)
    }
}

/// Specialized builder for time-series data
///
/// Every measurement shares one base name, base time and base unit; measurement times
/// are relative to the base time.
#[derive(Debug)]
pub struct TimeSeriesBuilder {
    base_name: String,
    base_time: f64,
    base_unit: Option<String>,
    measurements: Vec<(f64, f64)>, // (relative_time, value)
}

impl TimeSeriesBuilder {
    /// Create a new time series builder
    pub fn new<S: Into<String>>(base_name: S, base_time: f64) -> Self {
        Self {
            base_name: base_name.into(),
            base_time,
            base_unit: None,
            measurements: Vec::new(),
        }
    }

    /// Set the unit for all measurements
    pub fn unit<S: Into<String>>(mut self, unit: S) -> Self {
        self.base_unit = Some(unit.into());
        self
    }

    /// Add a measurement at a relative time
    pub fn measurement(mut self, relative_time: f64, value: f64) -> Self {
        self.measurements.push((relative_time, value));
        self
    }

    /// Add measurements from an iterator
    pub fn measurements<I>(mut self, measurements: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        self.measurements.extend(measurements);
        self
    }

    /// Add a measurement taken now
    pub fn measurement_now(mut self, value: f64) -> Self {
        let now = time::OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1.0e9;
        self.measurements.push((now - self.base_time, value));
        self
    }

    /// Build the time series pack
    pub fn build(self) -> Pack {
        let mut builder = PackBuilder::new()
            .base_name(self.base_name)
            .base_time(self.base_time);

        if let Some(unit) = self.base_unit {
            builder = builder.base_unit(unit);
        }

        for (time, value) in self.measurements {
            builder = builder.add_measurement("", value, time);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_basic_builder() {
        let pack = PackBuilder::new()
            .base_name("device1/")
            .base_unit("Cel")
            .add_value("temp", 22.5)
            .add_value("humidity", 45.0)
            .build();

        assert_eq!(pack.len(), 2);

        let first = &pack.records[0];
        assert_eq!(first.base_name, "device1/");
        assert_eq!(first.base_unit, "Cel");
        assert_eq!(first.name, "temp");
        assert!(!pack.records[1].has_base_fields());
    }

    #[test]
    fn test_builder_with_only_base_fields() {
        let pack = PackBuilder::new().base_version(10).build();
        assert_eq!(pack.len(), 1);
        assert_eq!(pack.records[0].base_version, 10);
        assert!(!pack.records[0].has_value());

        assert!(PackBuilder::new().build().is_empty());
    }

    #[test]
    fn test_measurement_builder() {
        let pack = PackBuilder::new()
            .add_measurement_with_unit("temperature", 25.0, "Cel", 1640995200.0)
            .build();

        assert_eq!(pack.len(), 1);
        let record = &pack.records[0];
        assert_eq!(record.value_f64(), Some(25.0));
        assert_eq!(record.unit, "Cel");
        assert_eq!(record.time, 1640995200.0);
    }

    #[test]
    fn test_mixed_values() {
        let pack = PackBuilder::new()
            .add_value("temp", 25.0)
            .add_string_value("status", "OK")
            .add_bool_value("enabled", true)
            .add_data_value("raw", b"\x01\x02")
            .add_sum("energy", 12.0, 5.0)
            .build();

        assert_eq!(pack.len(), 5);
        assert!(matches!(pack.records[0].value, Some(Value::Float(_))));
        assert!(matches!(pack.records[1].value, Some(Value::String(_))));
        assert!(matches!(pack.records[2].value, Some(Value::Bool(true))));
        assert!(matches!(pack.records[3].value, Some(Value::Data(_))));
        assert_eq!(pack.records[4].sum, Some(12.0));
        assert!(!pack.records[4].has_value());
    }

    #[test]
    fn test_time_series_builder() {
        let base_time = 1640995200.0;
        let pack = TimeSeriesBuilder::new("sensor1/temp", base_time)
            .unit("Cel")
            .measurement(0.0, 22.0)
            .measurements([(60.0, 22.5), (120.0, 23.0)])
            .build();

        assert_eq!(pack.len(), 3);
        let first = &pack.records[0];
        assert_eq!(first.base_name, "sensor1/temp");
        assert_eq!(first.base_time, base_time);
        assert_eq!(first.base_unit, "Cel");

        let normalized = crate::normalize_at(&pack, 0);
        let times: Vec<_> = normalized.iter().map(|r| r.time).collect();
        assert_eq!(times, [base_time, base_time + 60.0, base_time + 120.0]);
        assert!(normalized.iter().all(|r| r.name == "sensor1/temp"));
    }

    #[test]
    fn test_measurement_now_is_relative_to_base_time() {
        let pack = TimeSeriesBuilder::new("s/", 1_000.0)
            .measurement_now(1.0)
            .build();
        assert!(pack.records[0].time > 1_000_000_000.0);
    }
}
