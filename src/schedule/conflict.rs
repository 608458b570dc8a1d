use chrono::{DateTime, Utc};

use super::timeline::BookedSlot;

/// Half-open interval overlap: [s1, e1) and [s2, e2) collide iff
/// s1 < e2 && s2 < e1. An appointment ending exactly when another starts
/// does not conflict.
pub fn overlaps(
    s1: DateTime<Utc>,
    e1: DateTime<Utc>,
    s2: DateTime<Utc>,
    e2: DateTime<Utc>,
) -> bool {
    s1 < e2 && s2 < e1
}

/// Decides whether the candidate interval collides with any slot on the
/// timeline. `exclude_id` lets a reschedule ignore the appointment being
/// moved, so an appointment never conflicts with itself.
pub fn has_conflict(
    slots: &[BookedSlot],
    candidate_start: DateTime<Utc>,
    candidate_end: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> bool {
    slots
        .iter()
        .filter(|slot| exclude_id != Some(slot.id.as_str()))
        .any(|slot| overlaps(candidate_start, candidate_end, slot.start_time, slot.end_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
    }

    fn slot(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> BookedSlot {
        BookedSlot {
            id: id.to_string(),
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn partial_overlap_conflicts() {
        let slots = vec![slot("a", at(9, 0), at(9, 30))];
        assert!(has_conflict(&slots, at(9, 15), at(9, 45), None));
        assert!(has_conflict(&slots, at(8, 45), at(9, 15), None));
    }

    #[test]
    fn containment_conflicts() {
        let slots = vec![slot("a", at(9, 0), at(10, 0))];
        assert!(has_conflict(&slots, at(9, 15), at(9, 45), None));
        assert!(has_conflict(&slots, at(8, 30), at(10, 30), None));
    }

    #[test]
    fn back_to_back_does_not_conflict() {
        let slots = vec![slot("a", at(9, 0), at(9, 30))];
        assert!(!has_conflict(&slots, at(9, 30), at(10, 0), None));
        assert!(!has_conflict(&slots, at(8, 30), at(9, 0), None));
    }

    #[test]
    fn disjoint_does_not_conflict() {
        let slots = vec![slot("a", at(9, 0), at(9, 30))];
        assert!(!has_conflict(&slots, at(11, 0), at(11, 30), None));
    }

    #[test]
    fn exclusion_skips_own_slot() {
        let slots = vec![
            slot("a", at(9, 0), at(9, 30)),
            slot("b", at(10, 0), at(10, 30)),
        ];
        // Identical interval, excluded: no conflict with itself.
        assert!(!has_conflict(&slots, at(9, 0), at(9, 30), Some("a")));
        // Excluding one slot does not hide the other.
        assert!(has_conflict(&slots, at(10, 15), at(10, 45), Some("a")));
    }

    #[test]
    fn empty_timeline_never_conflicts() {
        assert!(!has_conflict(&[], at(9, 0), at(9, 30), None));
    }
}
