//! Payment-window policy.
//!
//! Accepting an application opens a payment window. The due date is always
//! (re)written; the payment status is only seeded when no other feature has
//! set one yet.

use admit_model::ApplicationData;
use chrono::{DateTime, TimeDelta, Utc};

/// Payment status seeded on acceptance.
pub const PAYMENT_STATUS_PENDING: &str = "pending_payment";

/// Default length of the payment window in days.
pub const DEFAULT_PAYMENT_WINDOW_DAYS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentWindow {
    pub due_date: DateTime<Utc>,
    pub status: &'static str,
}

impl PaymentWindow {
    /// Write the window into an application's data bag.
    pub fn apply_to(&self, data: &mut ApplicationData) {
        data.set_payment_due_date(self.due_date);
        data.set_payment_status_if_absent(self.status);
    }
}

/// Compute the payment window opened at `now`.
///
/// Returns `None` when `days` is not positive or the due date is not
/// representable.
pub fn compute_payment_window(now: DateTime<Utc>, days: i64) -> Option<PaymentWindow> {
    if days < 1 {
        return None;
    }
    let due_date = now.checked_add_signed(TimeDelta::try_days(days)?)?;
    Some(PaymentWindow {
        due_date,
        status: PAYMENT_STATUS_PENDING,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_window_is_ten_days() {
        let now = Utc.with_ymd_and_hms(2026, 12, 28, 15, 45, 10).unwrap();
        let window = compute_payment_window(now, DEFAULT_PAYMENT_WINDOW_DAYS).unwrap();
        assert_eq!(
            window.due_date,
            Utc.with_ymd_and_hms(2027, 1, 7, 15, 45, 10).unwrap()
        );
        assert_eq!(window.status, "pending_payment");
    }

    #[test]
    fn test_apply_keeps_existing_status() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut data = ApplicationData::from_value(Some(&json!({ "payment_status": "paid" })));
        compute_payment_window(now, 10).unwrap().apply_to(&mut data);

        assert_eq!(data.payment_status(), Some("paid"));
        assert_eq!(data.payment_due_date(), Some(now + TimeDelta::days(10)));
    }

    #[test]
    fn test_out_of_range_window_is_refused() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(compute_payment_window(now, 0), None);
        assert_eq!(compute_payment_window(now, -5), None);
        assert_eq!(compute_payment_window(now, i64::MAX), None);
        assert_eq!(compute_payment_window(DateTime::<Utc>::MAX_UTC, 1), None);
    }

    proptest! {
        #[test]
        fn due_date_is_exactly_window_after_now(secs in 0i64..4_000_000_000, days in 1i64..60) {
            let now = DateTime::from_timestamp(secs, 0).unwrap();
            let window = compute_payment_window(now, days).unwrap();
            prop_assert_eq!(window.due_date - now, TimeDelta::days(days));
        }
    }
}
