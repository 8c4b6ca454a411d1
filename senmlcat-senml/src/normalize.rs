//! SenML normalization - converting packs to resolved form
//!
//! A normalized pack carries no base name, base time or base unit: every record holds
//! its full name, an absolute time, its unit and the base version in effect. Base fields
//! are resolved in a single forward pass, so a base field declared by one record applies
//! to that record and to every later record until another record overrides it.

use crate::record::DEFAULT_BASE_VERSION;
use crate::{Pack, Record};

/// Normalize `pack` against the current wall clock
///
/// Relative times (`<= 0` once the base time is applied) are anchored to the current
/// Unix time truncated to whole seconds.
pub fn normalize(pack: &Pack) -> Pack {
    normalize_at(pack, now_unix_seconds())
}

/// Current Unix time in whole seconds, the clock behind [`normalize`]
pub fn now_unix_seconds() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Normalize `pack` with `now` as the current Unix time in seconds
///
/// The input is left untouched. Records whose only payload is opaque data, and records
/// with no value at all, are not part of the output.
pub fn normalize_at(pack: &Pack, now: i64) -> Pack {
    let mut bases = RunningBases::default();

    pack.records
        .iter()
        .map(|record| bases.resolve(record, now))
        .filter(Record::carries_measurement)
        .collect()
}

/// Base fields in effect at the current position of the pass
#[derive(Debug)]
struct RunningBases {
    name: String,
    time: f64,
    unit: String,
    version: i32,
}

impl Default for RunningBases {
    fn default() -> Self {
        Self {
            name: String::new(),
            time: 0.0,
            unit: String::new(),
            version: DEFAULT_BASE_VERSION,
        }
    }
}

impl RunningBases {
    fn absorb(&mut self, record: &Record) {
        if record.base_time != 0.0 {
            self.time = record.base_time;
        }
        if record.base_version != 0 {
            self.version = record.base_version;
        }
        if !record.base_unit.is_empty() {
            self.unit.clone_from(&record.base_unit);
        }
        if !record.base_name.is_empty() {
            self.name.clone_from(&record.base_name);
        }
    }

    fn resolve(&mut self, record: &Record, now: i64) -> Record {
        self.absorb(record);

        let mut time = self.time + record.time;
        if time <= 0.0 {
            time += now as f64;
        }

        Record {
            base_name: String::new(),
            base_time: 0.0,
            base_unit: String::new(),
            base_version: self.version,
            name: format!("{}{}", self.name, record.name),
            unit: if record.unit.is_empty() {
                self.unit.clone()
            } else {
                record.unit.clone()
            },
            time,
            ..record.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use crate::test_support::reference_pack;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_base_fields_are_inherited() {
        let pack = Pack::from(vec![
            Record::with_value("x", 1.0)
                .with_base_name("dev/")
                .with_base_time(100.0),
            Record::with_value("y", 2.0),
        ]);

        let normalized = normalize_at(&pack, NOW);

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized.records[0].name, "dev/x");
        assert_eq!(normalized.records[0].time, 100.0);
        assert_eq!(normalized.records[1].name, "dev/y");
        assert_eq!(normalized.records[1].time, 100.0);
        for record in &normalized {
            assert_eq!(record.base_version, DEFAULT_BASE_VERSION);
            assert!(record.base_name.is_empty());
            assert_eq!(record.base_time, 0.0);
        }
    }

    #[test]
    fn test_later_base_fields_override() {
        let pack = Pack::from(vec![
            Record::with_value("a", 1.0)
                .with_base_name("one/")
                .with_base_unit("V")
                .with_time(10.0),
            Record::with_value("b", 2.0)
                .with_base_name("two/")
                .with_base_version(10)
                .with_time(20.0),
            Record::with_value("c", 3.0).with_unit("A").with_time(30.0),
        ]);

        let normalized = normalize_at(&pack, NOW);

        let names: Vec<_> = normalized.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["one/a", "two/b", "two/c"]);
        assert_eq!(normalized.records[0].base_version, 5);
        assert_eq!(normalized.records[1].base_version, 10);
        assert_eq!(normalized.records[1].unit, "V");
        assert_eq!(normalized.records[2].unit, "A");
    }

    #[test]
    fn test_relative_time_uses_now() {
        let pack = Pack::from(vec![
            Record::with_value("past", 1.0).with_time(-30.0),
            Record::with_value("unset", 2.0),
        ]);

        let normalized = normalize_at(&pack, NOW);

        assert_eq!(normalized.records[0].time, (NOW - 30) as f64);
        assert_eq!(normalized.records[1].time, NOW as f64);
    }

    #[test]
    fn test_relative_time_keeps_fractional_offset() {
        let pack = Pack::from(vec![
            Record::with_value("a", 1.0)
                .with_base_time(-45.67)
                .with_time(-1.0),
            Record::with_value("b", 2.0).with_time(-0.25),
        ]);

        let normalized = normalize_at(&pack, NOW);

        // whole-second now, fractional relative offset
        assert_eq!(normalized.records[0].time, NOW as f64 + (-45.67 + -1.0));
        assert!((normalized.records[0].time - (NOW as f64 - 46.67)).abs() < 1e-6);
        // base time carries over to the next record
        assert_eq!(normalized.records[1].time, NOW as f64 + (-45.67 + -0.25));
    }

    #[test]
    fn test_subsecond_relative_time() {
        let pack = Pack::from(vec![Record::with_value("x", 1.0).with_time(-0.25)]);
        let normalized = normalize_at(&pack, NOW);
        assert_eq!(normalized.records[0].time, NOW as f64 - 0.25);
    }

    #[test]
    fn test_now_is_whole_seconds() {
        let now = now_unix_seconds();
        let pack = Pack::from(vec![Record::with_value("x", 1.0)]);
        let time = pack.normalize().records[0].time;
        assert_eq!(time.fract(), 0.0);
        assert!(time >= now as f64);
    }

    #[test]
    fn test_data_only_and_empty_records_are_dropped() {
        let pack = Pack::from(vec![
            Record::new().with_base_name("dev/"),
            Record::with_data_value("blob", b"\x00\x01"),
            Record::with_bool_value("flag", false),
        ]);

        let normalized = normalize_at(&pack, NOW);

        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized.records[0].name, "dev/flag");
        assert_eq!(normalized.records[0].value, Some(Value::Bool(false)));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let pack = reference_pack();
        let once = normalize_at(&pack, NOW);
        let twice = normalize_at(&once, NOW);
        assert_eq!(once, twice);
        assert!(once.iter().all(|r| r.base_name.is_empty() && r.base_unit.is_empty()));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let pack = reference_pack();
        let before = pack.clone();
        let _ = normalize_at(&pack, NOW);
        assert_eq!(pack, before);
    }

    #[test]
    fn test_link_and_sum_are_carried() {
        let pack = Pack::from(vec![
            Record::with_value("energy", 3.5)
                .with_sum(0.0)
                .with_link("</meter>")
                .with_time(5.0),
        ]);

        let normalized = normalize_at(&pack, NOW);

        assert_eq!(normalized.records[0].sum, Some(0.0));
        assert_eq!(normalized.records[0].link, "</meter>");
    }

    #[test]
    fn test_wall_clock_normalize_anchors_relative_times() {
        let pack = Pack::from(vec![Record::with_value("now", 1.0)]);
        let normalized = pack.normalize();
        // any sane clock is well past 2020-01-01
        assert!(normalized.records[0].time > 1_577_836_800.0);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_normalized_reference_pack_pretty_json() {
        let mut pack = reference_pack();
        pack.records[0].base_name = "dev123/".to_string();
        pack.records[0].base_time = 897845.67;

        let json = normalize_at(&pack, NOW).to_json_pretty().unwrap();

        let expected = "[\n  {\n    \"bver\": 5,\n    \"n\": \"dev123/temp\",\n    \"u\": \"degC\",\n    \"t\": 897844.67,\n    \"ut\": 10,\n    \"v\": 22.1,\n    \"s\": 0\n  },\n  {\n    \"bver\": 5,\n    \"n\": \"dev123/room\",\n    \"u\": \"degC\",\n    \"t\": 897844.67,\n    \"vs\": \"kitchen\"\n  },\n  {\n    \"bver\": 5,\n    \"n\": \"dev123/ok\",\n    \"u\": \"degC\",\n    \"t\": 897845.67,\n    \"vb\": true\n  }\n]";
        assert_eq!(json, expected);
    }
}
