//! Booking nodes.
//!
//! A booking records that a resource works on a task during an interval.
//! Bookings are only created when merging scheduler results and always hang
//! off exactly one task.

use chrono::NaiveDateTime;

use super::interval::Interval;
use super::keyword;
use super::node::{Clause, Node};

impl Node {
    /// Creates a booking of `resource` over [start, end).
    pub fn booking(resource: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::booking_over(resource, Interval::new(start, end))
    }

    /// Creates a booking of `resource` over `interval`.
    pub fn booking_over(resource: impl Into<String>, interval: Interval) -> Self {
        Node::new(keyword::BOOKING, resource).with_clause(Clause::Interval(interval))
    }

    /// Whether this node is a booking.
    pub fn is_booking(&self) -> bool {
        self.keyword() == keyword::BOOKING
    }

    /// Booked interval.
    pub fn booking_interval(&self) -> Option<&Interval> {
        if !self.is_booking() {
            return None;
        }
        self.clause().and_then(Clause::as_interval)
    }

    /// Bookings attached directly to this node.
    pub fn bookings(&self) -> impl Iterator<Item = &Node> {
        self.child_nodes(keyword::BOOKING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 10, 10)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_booking_interval() {
        let b = Node::booking("me", at(9), at(17));
        assert!(b.is_booking());
        assert_eq!(b.id(), "me");
        let interval = b.booking_interval().unwrap();
        assert_eq!(interval.start, at(9));
        assert_eq!(interval.end, at(17));
    }

    #[test]
    fn test_bookings_on_task() {
        let mut task = Node::task("t");
        task.set_property(Node::booking("me", at(9), at(12)));
        task.set_property(Node::booking("me", at(13), at(17)));
        // Same slot is replaced, not duplicated.
        task.set_property(Node::booking("me", at(13), at(17)));
        assert_eq!(task.bookings().count(), 2);
    }

    #[test]
    fn test_booking_over_keeps_utc() {
        let b = Node::booking_over("me", Interval::new(at(9), at(10)).in_utc());
        assert!(b.booking_interval().unwrap().utc);
        assert!(!Node::booking("me", at(9), at(10)).booking_interval().unwrap().utc);
    }

    #[test]
    fn test_non_booking_has_no_interval() {
        assert!(Node::task("t").booking_interval().is_none());
    }
}
