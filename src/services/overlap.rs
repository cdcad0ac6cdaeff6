// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan scheduling-conflict detection.

use crate::models::Plan;
use chrono::{DateTime, Utc};

/// Whether two half-open intervals `[a_start, a_end)` and `[b_start, b_end)`
/// share at least one instant.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Whether the candidate interval `[start, end)` conflicts with any plan.
///
/// Every plan in `existing` is considered; callers that want to ignore the
/// plan being edited must filter it out first.
pub fn overlaps(existing: &[Plan], start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    existing
        .iter()
        .any(|plan| intervals_overlap(plan.start_date, plan.end_date, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanStatus;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn plan(start: DateTime<Utc>, end: DateTime<Utc>) -> Plan {
        Plan {
            id: Uuid::new_v4(),
            title: "Trip".to_string(),
            description: String::new(),
            start_date: start,
            end_date: end,
            status: PlanStatus::InProgress,
            user_id: Uuid::new_v4(),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_adjacent_intervals_do_not_overlap() {
        let existing = vec![plan(jan(1), jan(5))];
        assert!(!overlaps(&existing, jan(5), jan(10)));
    }

    #[test]
    fn test_intersecting_intervals_overlap() {
        let existing = vec![plan(jan(1), jan(5))];
        assert!(overlaps(&existing, jan(4), jan(10)));
    }

    #[test]
    fn test_containment_overlaps() {
        let existing = vec![plan(jan(1), jan(10))];
        assert!(overlaps(&existing, jan(3), jan(4)));
        assert!(overlaps(&existing, jan(1), jan(10)));

        let inner = vec![plan(jan(3), jan(4))];
        assert!(overlaps(&inner, jan(1), jan(10)));
    }

    #[test]
    fn test_empty_set_never_overlaps() {
        assert!(!overlaps(&[], jan(1), jan(31)));
    }

    #[test]
    fn test_symmetric_for_single_pair() {
        let cases = [
            ((jan(1), jan(5)), (jan(5), jan(10))),
            ((jan(1), jan(5)), (jan(4), jan(10))),
            ((jan(2), jan(3)), (jan(1), jan(9))),
            ((jan(1), jan(2)), (jan(8), jan(9))),
        ];

        for ((a_start, a_end), (b_start, b_end)) in cases {
            assert_eq!(
                overlaps(&[plan(a_start, a_end)], b_start, b_end),
                overlaps(&[plan(b_start, b_end)], a_start, a_end),
            );
        }
    }

    #[test]
    fn test_any_conflicting_plan_counts() {
        let existing = vec![
            plan(jan(1), jan(2)),
            plan(jan(10), jan(12)),
            plan(jan(20), jan(25)),
        ];
        assert!(overlaps(&existing, jan(11), jan(15)));
        assert!(!overlaps(&existing, jan(12), jan(20)));
    }
}
