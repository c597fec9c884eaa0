use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Read-mostly rollup of activity for one calendar day.
///
/// Derived data: the store recomputes/increments it as components, scans,
/// and reports are created. Never independently mutable by clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub stat_date: NaiveDate,
    pub components_created: u64,
    pub scans_recorded: u64,
    pub orphan_scans: u64,
    pub reports_filed: u64,
}

impl DailyAggregate {
    pub fn empty(stat_date: NaiveDate) -> Self {
        Self {
            stat_date,
            components_created: 0,
            scans_recorded: 0,
            orphan_scans: 0,
            reports_filed: 0,
        }
    }

    pub fn note_component(&mut self) {
        self.components_created += 1;
    }

    /// Count a scan; orphans also bump the orphan counter.
    pub fn note_scan(&mut self, orphan: bool) {
        self.scans_recorded += 1;
        if orphan {
            self.orphan_scans += 1;
        }
    }

    pub fn note_report(&mut self) {
        self.reports_filed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let mut agg = DailyAggregate::empty(date);
        agg.note_component();
        agg.note_scan(false);
        agg.note_scan(true);
        agg.note_report();

        assert_eq!(agg.components_created, 1);
        assert_eq!(agg.scans_recorded, 2);
        assert_eq!(agg.orphan_scans, 1);
        assert_eq!(agg.reports_filed, 1);
    }
}
