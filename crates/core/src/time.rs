//! Timezone discipline helpers (spec §4.4, §9 "Time").
//!
//! All comparisons in the registry and workflow engine are UTC. Timestamps
//! that arrive without zone information — e.g. rows loaded from a
//! persistence layer that predates this discipline — are promoted to UTC
//! rather than rejected, matching spec §4.4's "naive timestamps encountered
//! during load-from-persistence are promoted to UTC before comparison".

use chrono::{DateTime, NaiveDateTime, Utc};

/// Interpret a naive (zone-less) timestamp as UTC.
pub fn promote_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    naive.and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn promotes_naive_timestamp_to_utc() {
        let naive = NaiveDate::from_ymd_opt(2026, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid calendar date");
        let promoted = promote_to_utc(naive);
        assert_eq!(promoted.timezone(), Utc);
        assert_eq!(promoted.naive_utc(), naive);
    }
}
