//! # FlowDesk Sources
//!
//! Demo snapshot sources for the automation pipeline: a mock CRM holding
//! leads and a mock carrier holding shipments with tracking history. Seed
//! timestamps are relative to the injected clock, so the data always looks
//! recent.

pub mod carrier;
pub mod crm;

pub use carrier::{MockCarrier, TrackingEvent};
pub use crm::MockCrm;

/// One 1-based page out of `items`. Page 0 and size 0 are empty.
pub(crate) fn paginate<T: Clone>(items: &[T], page: usize, size: usize) -> Vec<T> {
    let Some(index) = page.checked_sub(1) else {
        return Vec::new();
    };
    let start = index.saturating_mul(size);
    items.iter().skip(start).take(size).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=12).collect();
        assert_eq!(paginate(&items, 1, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(paginate(&items, 3, 5), vec![11, 12]);
        assert!(paginate(&items, 4, 5).is_empty());
        assert!(paginate(&items, 0, 5).is_empty());
        assert!(paginate(&items, 1, 0).is_empty());
        assert!(paginate(&items, usize::MAX, usize::MAX).is_empty());
    }
}
