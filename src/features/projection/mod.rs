/// 日付演算と支払い周期
pub mod period;

/// 期間内の支払い日の列挙
pub mod occurrences;

pub use occurrences::{first_occurrence_on_or_after, occurrences_in_window};
pub use period::{
    add_days, advance, end_of_month, normalize_to_midnight, start_of_month, BillingPeriod, Cadence,
    DateWindow,
};
