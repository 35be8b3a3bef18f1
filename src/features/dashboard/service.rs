use super::models::{
    CalendarDay, CalendarEntry, CalendarMonth, CategorySpending, DashboardStats, MonthlyBucket,
    Renewal, RenewalSummary,
};
use crate::features::projection::{
    add_days, end_of_month, occurrences_in_window, start_of_month, Cadence, DateWindow,
};
use crate::features::subscriptions::Subscription;
use crate::shared::errors::{AppError, AppResult};
use chrono::{Datelike, Months, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// カテゴリ未設定のサブスクリプションの表示名
pub const UNCATEGORIZED: &str = "未分類";

/// 「今後の更新」の対象日数
const RENEWAL_HORIZON_DAYS: u64 = 30;

/// 年間予測の対象月数
const PROJECTION_MONTHS: u32 = 12;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 表示通貨を決める（先頭のサブスクリプションの通貨、無ければ既定値）
fn display_currency(subscriptions: &[Subscription], fallback_currency: &str) -> (String, bool) {
    let currency = subscriptions
        .first()
        .map(|s| s.currency.clone())
        .unwrap_or_else(|| fallback_currency.to_string());
    let mixed = subscriptions.iter().any(|s| s.currency != currency);
    (currency, mixed)
}

/// 支払い予測に使える周期と起点
///
/// 次回支払日が無いもの、支払い間隔が不正なものはNone
fn projection_inputs(subscription: &Subscription) -> Option<(Cadence, NaiveDate)> {
    let anchor = subscription.next_payment_date?;
    match subscription.cadence() {
        Some(cadence) => Some((cadence, anchor)),
        None => {
            log::warn!(
                "支払い間隔が不正なため集計から除外します: ID {} (間隔 {})",
                subscription.id,
                subscription.billing_interval
            );
            None
        }
    }
}

fn category_label(subscription: &Subscription) -> String {
    subscription
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNCATEGORIZED)
        .to_string()
}

/// ダッシュボードの集計を行う
///
/// # 引数
/// * `subscriptions` - 所有者のサブスクリプション一覧
/// * `today` - 所有者のタイムゾーンでの今日の日付
/// * `fallback_currency` - サブスクリプションが無い場合の表示通貨
///
/// # 戻り値
/// 集計結果。全ての値は同じ`today`から計算される
///
/// 各期間はすべて`today`から始まり、年間予測の期間に含まれるため、
/// 支払い日の列挙はサブスクリプションごとに1回だけ行う。
pub fn compute_stats(
    subscriptions: &[Subscription],
    today: NaiveDate,
    fallback_currency: &str,
) -> DashboardStats {
    let (currency, mixed_currencies) = display_currency(subscriptions, fallback_currency);
    if mixed_currencies {
        log::warn!("複数の通貨が混在しています。金額は換算せずに{currency}として合算します");
    }

    let this_month_end = end_of_month(today);
    let this_month = DateWindow::new(today, this_month_end);
    let through_next_month = DateWindow::new(
        today,
        add_days(this_month_end, 1)
            .map(end_of_month)
            .unwrap_or(this_month_end),
    );
    let renewal_window = DateWindow::new(
        today,
        add_days(today, RENEWAL_HORIZON_DAYS).unwrap_or(NaiveDate::MAX),
    );
    let year_window = DateWindow::new(
        today,
        today
            .checked_add_months(Months::new(PROJECTION_MONTHS))
            .unwrap_or(NaiveDate::MAX),
    );

    let mut active_count = 0;
    let mut added_this_month = 0;
    let mut due_this_calendar_month = 0.0;
    let mut due_next_calendar_month = 0.0;
    let mut projected_year_cost = 0.0;
    let mut due_next_30_days = RenewalSummary::default();
    let mut trend = empty_trend(year_window);
    let mut categories: HashMap<String, f64> = HashMap::new();

    for subscription in subscriptions {
        if subscription.end_date.map_or(true, |end| end > today) {
            active_count += 1;
        }

        let created = subscription.created_at.date_naive();
        if created.year() == today.year() && created.month() == today.month() {
            added_this_month += 1;
        }

        let Some((cadence, anchor)) = projection_inputs(subscription) else {
            continue;
        };

        let cost = subscription.cost_value();
        let occurrences = occurrences_in_window(cadence, anchor, subscription.end_date, year_window);
        let Some(&first) = occurrences.first() else {
            continue;
        };

        if this_month.contains(first) {
            due_this_calendar_month += cost;
        }
        if through_next_month.contains(first) {
            due_next_calendar_month += cost;
        }
        if renewal_window.contains(first) {
            due_next_30_days.count += 1;
            due_next_30_days.cost += cost;
            due_next_30_days.renewals.push(Renewal {
                subscription_id: subscription.id,
                name: subscription.name.clone(),
                date: first,
                cost,
                currency: subscription.currency.clone(),
            });
        }

        for date in &occurrences {
            projected_year_cost += cost;
            *trend.entry((date.year(), date.month())).or_insert(0.0) += cost;
        }
        *categories.entry(category_label(subscription)).or_insert(0.0) +=
            cost * occurrences.len() as f64;
    }

    due_next_30_days.cost = round2(due_next_30_days.cost);
    due_next_30_days
        .renewals
        .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));

    let monthly_trend = trend
        .into_iter()
        .map(|((year, month), cost)| MonthlyBucket {
            year,
            month,
            cost: round2(cost),
        })
        .collect();

    let mut spending_by_category: Vec<CategorySpending> = categories
        .into_iter()
        .filter(|(_, cost)| *cost > 0.0)
        .map(|(category, cost)| CategorySpending {
            category,
            cost: round2(cost),
        })
        .collect();
    spending_by_category.sort_by(|a, b| {
        b.cost
            .total_cmp(&a.cost)
            .then_with(|| a.category.cmp(&b.category))
    });

    log::debug!(
        "ダッシュボード集計: {}件, 年間予測 {:.2} {currency}",
        subscriptions.len(),
        projected_year_cost
    );

    DashboardStats {
        currency,
        mixed_currencies,
        active_count,
        added_this_month,
        due_this_calendar_month: round2(due_this_calendar_month),
        due_next_calendar_month: round2(due_next_calendar_month),
        due_next_30_days,
        projected_year_cost: round2(projected_year_cost),
        monthly_trend,
        spending_by_category,
    }
}

/// 期間に含まれる全ての月を0円で初期化する
fn empty_trend(window: DateWindow) -> BTreeMap<(i32, u32), f64> {
    let mut trend = BTreeMap::new();
    let mut month = start_of_month(window.start);
    while month <= window.end {
        trend.insert((month.year(), month.month()), 0.0);
        match month.checked_add_months(Months::new(1)) {
            Some(next) => month = next,
            None => break,
        }
    }
    trend
}

/// 指定した月のカレンダーを作成する
///
/// # 引数
/// * `subscriptions` - 所有者のサブスクリプション一覧
/// * `year`, `month` - 対象の年月
/// * `today` - 残りの支払額を計算する基準日
/// * `fallback_currency` - サブスクリプションが無い場合の表示通貨
///
/// # 戻り値
/// 支払いのある日のリスト、または年月が不正な場合はバリデーションエラー
pub fn calendar_month(
    subscriptions: &[Subscription],
    year: i32,
    month: u32,
    today: NaiveDate,
    fallback_currency: &str,
) -> AppResult<CalendarMonth> {
    let first_day = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("不正な年月です: {year}-{month}")))?;
    let window = DateWindow::new(first_day, end_of_month(first_day));
    let (currency, _) = display_currency(subscriptions, fallback_currency);

    let mut days: BTreeMap<NaiveDate, Vec<CalendarEntry>> = BTreeMap::new();
    let mut total_due = 0.0;
    let mut remaining_due = 0.0;

    for subscription in subscriptions {
        let Some((cadence, anchor)) = projection_inputs(subscription) else {
            continue;
        };
        let cost = subscription.cost_value();

        for date in occurrences_in_window(cadence, anchor, subscription.end_date, window) {
            total_due += cost;
            if date >= today {
                remaining_due += cost;
            }
            days.entry(date).or_default().push(CalendarEntry {
                subscription_id: subscription.id,
                name: subscription.name.clone(),
                cost,
                currency: subscription.currency.clone(),
            });
        }
    }

    let days = days
        .into_iter()
        .map(|(date, entries)| CalendarDay {
            date,
            total: round2(entries.iter().map(|e| e.cost).sum()),
            entries,
        })
        .collect();

    Ok(CalendarMonth {
        year,
        month,
        currency,
        days,
        total_due: round2(total_due),
        remaining_due: round2(remaining_due),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::projection::BillingPeriod;
    use crate::features::subscriptions::SubscriptionStatus;
    use chrono::{TimeZone, Utc};
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn subscription(
        id: i64,
        cost: Option<f64>,
        period: BillingPeriod,
        next_payment_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Subscription {
        let created_at = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        Subscription {
            id,
            owner_id: "owner-1".to_string(),
            name: format!("Service {id}"),
            cost,
            currency: "EUR".to_string(),
            billing_interval: 1,
            billing_period: period,
            next_payment_date,
            category: None,
            payment_method: None,
            start_date: date(2025, 1, 1),
            end_date,
            url: None,
            notes: None,
            status: SubscriptionStatus::Active,
            created_at,
            updated_at: created_at,
        }
    }

    fn netflix(end_date: Option<NaiveDate>) -> Subscription {
        subscription(
            1,
            Some(12.99),
            BillingPeriod::Month,
            Some(date(2025, 10, 4)),
            end_date,
        )
    }

    #[test]
    fn test_monthly_subscription_due_this_month() {
        let stats = compute_stats(&[netflix(None)], date(2025, 10, 1), "HUF");

        assert_eq!(stats.currency, "EUR");
        assert!(!stats.mixed_currencies);
        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.due_this_calendar_month, 12.99);
        assert_eq!(stats.due_next_calendar_month, 12.99);
        assert_eq!(stats.due_next_30_days.count, 1);
        assert_eq!(stats.due_next_30_days.cost, 12.99);
        assert_eq!(stats.due_next_30_days.renewals[0].date, date(2025, 10, 4));
        // 2025-10-04 から 2026-09-04 までの12回
        assert_eq!(stats.projected_year_cost, round2(12.99 * 12.0));
    }

    #[test]
    fn test_end_date_before_first_occurrence_excludes_projections() {
        let subscriptions = [netflix(Some(date(2025, 10, 3)))];
        let stats = compute_stats(&subscriptions, date(2025, 10, 1), "HUF");

        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.due_this_calendar_month, 0.0);
        assert_eq!(stats.due_next_calendar_month, 0.0);
        assert_eq!(stats.due_next_30_days.count, 0);
        assert_eq!(stats.projected_year_cost, 0.0);

        let after_end = compute_stats(&subscriptions, date(2025, 10, 4), "HUF");
        assert_eq!(after_end.active_count, 0);
    }

    #[test]
    fn test_end_date_on_occurrence_is_included() {
        let stats = compute_stats(&[netflix(Some(date(2025, 10, 4)))], date(2025, 10, 1), "HUF");
        assert_eq!(stats.due_this_calendar_month, 12.99);
        assert_eq!(stats.projected_year_cost, 12.99);
    }

    #[test]
    fn test_yearly_subscription_anchored_in_the_past() {
        // 基準日は期間外（過去）だが、期間内に1回だけ支払いがある
        let yearly = subscription(
            2,
            Some(120.0),
            BillingPeriod::Year,
            Some(date(2024, 3, 15)),
            None,
        );
        let stats = compute_stats(&[yearly], date(2025, 10, 1), "HUF");

        assert_eq!(stats.projected_year_cost, 120.0);
        assert_eq!(stats.due_this_calendar_month, 0.0);
        assert_eq!(stats.due_next_30_days.count, 0);
        let march = stats
            .monthly_trend
            .iter()
            .find(|b| b.year == 2026 && b.month == 3)
            .unwrap();
        assert_eq!(march.cost, 120.0);
    }

    #[test]
    fn test_next_month_window_starts_today() {
        let november = subscription(
            3,
            Some(5.0),
            BillingPeriod::Year,
            Some(date(2025, 11, 20)),
            None,
        );
        let stats = compute_stats(&[netflix(None), november], date(2025, 10, 1), "HUF");

        assert_eq!(stats.due_this_calendar_month, 12.99);
        assert_eq!(stats.due_next_calendar_month, 17.99);
    }

    #[test]
    fn test_renewal_horizon_is_thirty_days_inclusive() {
        let yearly = |id, next| subscription(id, Some(10.0), BillingPeriod::Year, Some(next), None);
        let subscriptions = [yearly(1, date(2025, 10, 31)), yearly(2, date(2025, 11, 1))];
        let stats = compute_stats(&subscriptions, date(2025, 10, 1), "HUF");

        // 今日+30日は含み、今日+31日は含まない
        assert_eq!(stats.due_next_30_days.count, 1);
        assert_eq!(stats.due_next_30_days.cost, 10.0);
        assert_eq!(stats.due_next_30_days.renewals[0].subscription_id, 1);
    }

    #[test]
    fn test_end_date_today_is_not_active() {
        let stats = compute_stats(&[netflix(Some(date(2025, 10, 1)))], date(2025, 10, 1), "HUF");

        assert_eq!(stats.active_count, 0);
        assert_eq!(stats.projected_year_cost, 0.0);
    }

    #[test]
    fn test_first_of_next_month_from_last_day_of_month() {
        let yearly = subscription(4, Some(30.0), BillingPeriod::Year, Some(date(2025, 11, 1)), None);
        let stats = compute_stats(&[yearly], date(2025, 10, 31), "HUF");

        assert_eq!(stats.due_this_calendar_month, 0.0);
        assert_eq!(stats.due_next_calendar_month, 30.0);
        assert_eq!(stats.due_next_30_days.count, 1);
    }

    #[test]
    fn test_daily_subscription_counts_both_window_ends() {
        let daily = subscription(5, Some(10.0), BillingPeriod::Day, Some(date(2025, 10, 1)), None);
        let stats = compute_stats(&[daily], date(2025, 10, 1), "HUF");

        // 2025-10-01 から 2026-10-01 までの366日
        assert_eq!(stats.projected_year_cost, 3660.0);
        assert_eq!(stats.due_this_calendar_month, 10.0);
    }

    #[test]
    fn test_empty_list_uses_fallback_currency() {
        let stats = compute_stats(&[], date(2025, 10, 1), "HUF");

        assert_eq!(stats.currency, "HUF");
        assert_eq!(stats.active_count, 0);
        assert_eq!(stats.added_this_month, 0);
        assert_eq!(stats.projected_year_cost, 0.0);
        assert!(stats.due_next_30_days.renewals.is_empty());
        assert!(stats.spending_by_category.is_empty());
        assert_eq!(stats.monthly_trend.len(), 13);
        assert!(stats.monthly_trend.iter().all(|b| b.cost == 0.0));
    }

    #[test]
    fn test_missing_cost_and_next_payment_date() {
        let mut no_anchor = subscription(4, Some(10.0), BillingPeriod::Month, None, None);
        no_anchor.created_at = Utc.with_ymd_and_hms(2025, 10, 1, 8, 0, 0).unwrap();
        let no_cost = subscription(5, None, BillingPeriod::Month, Some(date(2025, 10, 5)), None);

        let stats = compute_stats(&[no_anchor, no_cost], date(2025, 10, 1), "HUF");

        assert_eq!(stats.active_count, 2);
        assert_eq!(stats.added_this_month, 1);
        assert_eq!(stats.due_next_30_days.count, 1);
        assert_eq!(stats.due_next_30_days.cost, 0.0);
        assert_eq!(stats.projected_year_cost, 0.0);
    }

    #[test]
    fn test_invalid_interval_is_skipped() {
        let mut broken = netflix(None);
        broken.billing_interval = 0;

        let stats = compute_stats(&[broken], date(2025, 10, 1), "HUF");
        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.projected_year_cost, 0.0);
    }

    #[test]
    fn test_mixed_currencies_flag() {
        let mut forint = subscription(6, Some(4990.0), BillingPeriod::Month, Some(date(2025, 10, 8)), None);
        forint.currency = "HUF".to_string();

        let stats = compute_stats(&[netflix(None), forint], date(2025, 10, 1), "HUF");
        assert_eq!(stats.currency, "EUR");
        assert!(stats.mixed_currencies);
    }

    #[test]
    fn test_spending_by_category() {
        let mut music = subscription(7, Some(6.0), BillingPeriod::Month, Some(date(2025, 10, 10)), None);
        music.category = Some("Music".to_string());
        let mut cloud = subscription(8, Some(100.0), BillingPeriod::Year, Some(date(2026, 1, 1)), None);
        cloud.category = Some("  ".to_string());

        let stats = compute_stats(&[music, cloud], date(2025, 10, 1), "HUF");
        assert_eq!(
            stats.spending_by_category,
            vec![
                CategorySpending {
                    category: UNCATEGORIZED.to_string(),
                    cost: 100.0
                },
                CategorySpending {
                    category: "Music".to_string(),
                    cost: 72.0
                },
            ]
        );
    }

    #[test]
    fn test_compute_stats_is_idempotent() {
        let subscriptions = vec![
            netflix(None),
            subscription(9, Some(3.5), BillingPeriod::Week, Some(date(2025, 9, 1)), None),
            subscription(10, Some(1.0), BillingPeriod::Day, Some(date(2025, 10, 2)), Some(date(2026, 2, 1))),
        ];
        let today = date(2025, 10, 1);

        assert_eq!(
            compute_stats(&subscriptions, today, "HUF"),
            compute_stats(&subscriptions, today, "HUF")
        );
    }

    #[test]
    fn test_calendar_month() {
        let weekly = subscription(11, Some(2.5), BillingPeriod::Week, Some(date(2025, 10, 3)), None);
        let month = calendar_month(&[netflix(None), weekly], 2025, 10, date(2025, 10, 10), "HUF").unwrap();

        assert_eq!(month.currency, "EUR");
        let dates: Vec<NaiveDate> = month.days.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2025, 10, 3),
                date(2025, 10, 4),
                date(2025, 10, 10),
                date(2025, 10, 17),
                date(2025, 10, 24),
                date(2025, 10, 31),
            ]
        );
        assert_eq!(month.total_due, round2(12.99 + 2.5 * 5.0));
        assert_eq!(month.remaining_due, 10.0);
    }

    #[test]
    fn test_calendar_month_rejects_invalid_month() {
        assert!(matches!(
            calendar_month(&[], 2025, 13, date(2025, 10, 1), "HUF"),
            Err(AppError::Validation(_))
        ));
    }

    #[quickcheck]
    fn prop_trend_buckets_sum_to_projected_year_cost(
        offsets: Vec<(u16, u8, u8, u16)>,
        today_offset: u16,
    ) -> TestResult {
        if offsets.len() > 20 {
            return TestResult::discard();
        }
        let base = date(2020, 1, 1);
        let today = add_days(base, u64::from(today_offset % 3_000)).unwrap();

        let subscriptions: Vec<Subscription> = offsets
            .iter()
            .enumerate()
            .map(|(i, (anchor, selector, interval, cents))| {
                let mut s = subscription(
                    i as i64,
                    Some(f64::from(*cents % 10_000) / 100.0),
                    BillingPeriod::ALL[usize::from(selector % 4)],
                    add_days(base, u64::from(anchor % 4_000)),
                    None,
                );
                s.billing_interval = i64::from(interval % 6) + 1;
                s
            })
            .collect();

        let stats = compute_stats(&subscriptions, today, "HUF");
        let bucket_sum: f64 = stats.monthly_trend.iter().map(|b| b.cost).sum();

        TestResult::from_bool((bucket_sum - stats.projected_year_cost).abs() < 0.1)
    }
}
