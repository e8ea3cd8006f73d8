use slot_types::{CanonicalSlot, DayAvailability};
use std::collections::HashSet;

use crate::config::Config;
use crate::error::CycleError;

/// Inclusion rules applied while flattening raw availability
#[derive(Debug, Clone, Default)]
pub struct SlotFilter {
    pub ignored_resources: HashSet<String>,
    pub min_hour: Option<u32>,
}

impl SlotFilter {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ignored_resources: config.ignored_resources.iter().cloned().collect(),
            min_hour: config.min_hour,
        }
    }

    fn ignores(&self, resource_id: &str) -> bool {
        self.ignored_resources.contains(resource_id)
    }
}

/// Flatten per-day / per-resource / per-slot records into canonical slots,
/// dropping everything the filter rejects.
///
/// Slots without a start time are skipped. A start time whose hour cannot be
/// read while the minimum-hour rule is active aborts the cycle.
pub fn normalize(days: &[DayAvailability], filter: &SlotFilter) -> Result<Vec<CanonicalSlot>, CycleError> {
    let mut slots = Vec::new();

    for day in days {
        for resource in &day.resources {
            let resource_id = resource.resource_id();
            if filter.ignores(resource_id) {
                continue;
            }

            for raw in resource.slots() {
                let Some(start_time) = raw.start_time.as_deref() else {
                    tracing::debug!(resource = %resource_id, date = %day.date, "slot without start_time skipped");
                    continue;
                };

                if let Some(min_hour) = filter.min_hour {
                    if start_hour(resource_id, start_time)? < min_hour {
                        continue;
                    }
                }

                slots.push(CanonicalSlot {
                    date: day.date,
                    resource_id: resource_id.to_string(),
                    start_time: start_time.to_string(),
                    price: raw.price.clone(),
                    duration: raw.duration,
                });
            }
        }
    }

    Ok(slots)
}

/// Hour part of an `HH:MM[:SS]` start time.
pub fn start_hour(resource_id: &str, start_time: &str) -> Result<u32, CycleError> {
    start_time
        .split_once(':')
        .and_then(|(hour, _)| hour.trim().parse().ok())
        .ok_or_else(|| CycleError::MalformedStartTime {
            resource_id: resource_id.to_string(),
            start_time: start_time.to_string(),
        })
}

/// Sort by (date, start time) ascending, the order notifications list slots in.
pub fn sort_for_display(slots: &mut [CanonicalSlot]) {
    slots.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.display_time().cmp(b.display_time()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use slot_types::{Price, RawResource, RawSlot};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn raw_slot(start: &str, price: f64) -> RawSlot {
        RawSlot {
            start_time: Some(start.to_string()),
            price: Some(Price::Amount(price)),
            duration: None,
        }
    }

    fn resource(id: Option<&str>, slots: Vec<RawSlot>) -> RawResource {
        RawResource {
            resource_id: id.map(str::to_string),
            slots: Some(slots),
        }
    }

    fn day(d: &str, resources: Vec<RawResource>) -> DayAvailability {
        DayAvailability {
            date: date(d),
            resources,
        }
    }

    fn sample_days() -> Vec<DayAvailability> {
        vec![
            day(
                "2026-10-19",
                vec![
                    resource(Some("R1"), vec![raw_slot("16:30:00", 10.0), raw_slot("18:00:00", 12.0)]),
                    resource(Some("OUT"), vec![raw_slot("19:00:00", 8.0)]),
                ],
            ),
            day(
                "2026-10-20",
                vec![resource(None, vec![raw_slot("09:00:00", 6.0), raw_slot("20:30:00", 14.0)])],
            ),
        ]
    }

    #[test]
    fn test_min_hour_scenario() {
        let days = vec![day(
            "2026-10-19",
            vec![resource(Some("R1"), vec![raw_slot("16:30", 10.0), raw_slot("18:00", 12.0)])],
        )];
        let filter = SlotFilter {
            min_hour: Some(17),
            ..Default::default()
        };

        let slots = normalize(&days, &filter).unwrap();

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].date, date("2026-10-19"));
        assert_eq!(slots[0].resource_id, "R1");
        assert_eq!(slots[0].start_time, "18:00");
        assert_eq!(slots[0].price, Some(Price::Amount(12.0)));
        assert_eq!(slots[0].id().as_str(), "2026-10-19_R1_18:00");
    }

    #[test]
    fn test_no_filter_passes_everything() {
        let slots = normalize(&sample_days(), &SlotFilter::default()).unwrap();
        assert_eq!(slots.len(), 5);
        assert!(slots.iter().any(|s| s.resource_id == "Unknown"));
    }

    #[test]
    fn test_filters_only_remove() {
        let days = sample_days();
        let unfiltered: HashSet<_> = normalize(&days, &SlotFilter::default())
            .unwrap()
            .iter()
            .map(CanonicalSlot::id)
            .collect();

        let filter = SlotFilter {
            ignored_resources: HashSet::from(["OUT".to_string()]),
            min_hour: Some(17),
        };
        let filtered = normalize(&days, &filter).unwrap();
        let filtered_ids: HashSet<_> = filtered.iter().map(CanonicalSlot::id).collect();

        assert!(filtered_ids.is_subset(&unfiltered));
        for slot in &filtered {
            assert_ne!(slot.resource_id, "OUT");
            assert!(start_hour(&slot.resource_id, &slot.start_time).unwrap() >= 17);
        }
        // Passing both rules means present.
        assert_eq!(filtered.len(), 2);
        assert!(filtered_ids.contains(&slot_types::SlotId::new(date("2026-10-19"), "R1", "18:00:00")));
        assert!(filtered_ids.contains(&slot_types::SlotId::new(date("2026-10-20"), "Unknown", "20:30:00")));
    }

    #[test]
    fn test_ignored_resource_only() {
        let filter = SlotFilter {
            ignored_resources: HashSet::from(["R1".to_string()]),
            min_hour: None,
        };
        let slots = normalize(&sample_days(), &filter).unwrap();
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|s| s.resource_id != "R1"));
    }

    #[test]
    fn test_slot_without_start_time_skipped() {
        let days = vec![day(
            "2026-10-19",
            vec![resource(
                Some("R1"),
                vec![
                    RawSlot {
                        start_time: None,
                        price: None,
                        duration: Some(60),
                    },
                    raw_slot("18:00:00", 12.0),
                ],
            )],
        )];
        let slots = normalize(&days, &SlotFilter::default()).unwrap();
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_malformed_start_time_fails_with_min_hour() {
        let days = vec![day("2026-10-19", vec![resource(Some("R1"), vec![raw_slot("1800", 12.0)])])];
        let filter = SlotFilter {
            min_hour: Some(17),
            ..Default::default()
        };

        match normalize(&days, &filter) {
            Err(CycleError::MalformedStartTime { resource_id, start_time }) => {
                assert_eq!(resource_id, "R1");
                assert_eq!(start_time, "1800");
            }
            other => panic!("expected MalformedStartTime, got {:?}", other),
        }

        // Without the hour rule the raw string is never parsed.
        assert_eq!(normalize(&days, &SlotFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_start_hour() {
        assert_eq!(start_hour("R", "07:30:00").unwrap(), 7);
        assert_eq!(start_hour("R", "23:00").unwrap(), 23);
        assert!(start_hour("R", "ab:00").is_err());
        assert!(start_hour("R", "").is_err());
    }

    #[test]
    fn test_sort_for_display() {
        let mut slots = normalize(&sample_days(), &SlotFilter::default()).unwrap();
        slots.reverse();
        sort_for_display(&mut slots);

        let order: Vec<_> = slots
            .iter()
            .map(|s| (s.date.to_string(), s.display_time().to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2026-10-19".to_string(), "16:30".to_string()),
                ("2026-10-19".to_string(), "18:00".to_string()),
                ("2026-10-19".to_string(), "19:00".to_string()),
                ("2026-10-20".to_string(), "09:00".to_string()),
                ("2026-10-20".to_string(), "20:30".to_string()),
            ]
        );
    }
}
