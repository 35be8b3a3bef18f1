use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 期間内に更新を迎えるサブスクリプション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renewal {
    pub subscription_id: i64,
    pub name: String,
    pub date: NaiveDate, // 期間内で最初の支払日
    pub cost: f64,
    pub currency: String,
}

/// 今後30日間の更新予定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenewalSummary {
    pub count: usize,
    pub cost: f64,
    pub renewals: Vec<Renewal>,
}

/// 月別の支払い予定額
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub year: i32,
    pub month: u32,
    pub cost: f64,
}

/// カテゴリ別の支払い予定額（12か月分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category: String,
    pub cost: f64,
}

/// ダッシュボードの集計結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub currency: String,
    pub mixed_currencies: bool,
    pub active_count: usize,
    pub added_this_month: usize,
    pub due_this_calendar_month: f64,
    pub due_next_calendar_month: f64,
    pub due_next_30_days: RenewalSummary,
    pub projected_year_cost: f64,
    pub monthly_trend: Vec<MonthlyBucket>,
    pub spending_by_category: Vec<CategorySpending>,
}

/// カレンダーの1件分の支払い
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub subscription_id: i64,
    pub name: String,
    pub cost: f64,
    pub currency: String,
}

/// 支払いのある日
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub entries: Vec<CalendarEntry>,
    pub total: f64,
}

/// 1か月分のカレンダー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub currency: String,
    pub days: Vec<CalendarDay>,
    pub total_due: f64,
    pub remaining_due: f64, // 今日以降の支払い分
}
