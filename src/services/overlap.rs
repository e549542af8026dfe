//! Interval overlap checks for bookings on one item

use chrono::{DateTime, Utc};

use crate::models::Booking;

/// Half-open intervals `[a_start, a_end)` and `[b_start, b_end)` intersect.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// First booking that still holds the item and intersects `[start, end)`.
/// Rejected and canceled bookings never conflict.
pub fn find_conflict<'a>(
    existing: &'a [Booking],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<&'a Booking> {
    existing
        .iter()
        .filter(|b| b.status.blocks_item())
        .find(|b| overlaps(b.start, b.end, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn booking(id: i64, start: i64, end: i64, status: BookingStatus) -> Booking {
        Booking {
            id,
            start: at(start),
            end: at(end),
            item_id: 1,
            booker_id: 2,
            status,
        }
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let points = [0, 10, 20, 30, 40];
        for a in points {
            for b in points.iter().copied().filter(|b| *b > a) {
                for c in points {
                    for d in points.iter().copied().filter(|d| *d > c) {
                        assert_eq!(
                            overlaps(at(a), at(b), at(c), at(d)),
                            overlaps(at(c), at(d), at(a), at(b)),
                            "[{a},{b}) vs [{c},{d})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        assert!(!overlaps(at(0), at(60), at(60), at(120)));
        assert!(!overlaps(at(60), at(120), at(0), at(60)));
        assert!(overlaps(at(0), at(61), at(60), at(120)));
    }

    #[test]
    fn test_containment_overlaps() {
        assert!(overlaps(at(0), at(120), at(30), at(45)));
        assert!(overlaps(at(30), at(45), at(0), at(120)));
    }

    #[test]
    fn test_find_conflict_ignores_released_bookings() {
        let existing = vec![
            booking(1, 60, 120, BookingStatus::Rejected),
            booking(2, 60, 120, BookingStatus::Canceled),
            booking(3, 200, 260, BookingStatus::Approved),
        ];
        assert!(find_conflict(&existing, at(90), at(105)).is_none());

        let hit = find_conflict(&existing, at(250), at(300)).map(|b| b.id);
        assert_eq!(hit, Some(3));
    }

    #[test]
    fn test_waiting_booking_blocks() {
        let existing = vec![booking(1, 60, 120, BookingStatus::Waiting)];
        assert_eq!(find_conflict(&existing, at(90), at(105)).map(|b| b.id), Some(1));
    }
}
