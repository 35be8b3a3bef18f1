use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 支払い周期の単位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl BillingPeriod {
    /// 全ての周期単位
    pub const ALL: [BillingPeriod; 4] = [
        BillingPeriod::Day,
        BillingPeriod::Week,
        BillingPeriod::Month,
        BillingPeriod::Year,
    ];

    /// データベース保存用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Day => "Day",
            BillingPeriod::Week => "Week",
            BillingPeriod::Month => "Month",
            BillingPeriod::Year => "Year",
        }
    }

    /// 文字列から周期単位を解析する（大文字小文字は区別しない）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Some(BillingPeriod::Day),
            "week" => Some(BillingPeriod::Week),
            "month" => Some(BillingPeriod::Month),
            "year" => Some(BillingPeriod::Year),
            _ => None,
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 支払い周期（間隔と単位の組）
///
/// 間隔は常に1以上。0以下の間隔は`new`で拒否される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cadence {
    interval: u32,
    period: BillingPeriod,
}

impl Cadence {
    /// 周期を作成する
    ///
    /// # 戻り値
    /// 間隔が1以上の場合はSome、それ以外はNone
    pub fn new(interval: u32, period: BillingPeriod) -> Option<Self> {
        (interval >= 1).then_some(Self { interval, period })
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn period(&self) -> BillingPeriod {
        self.period
    }

    /// 1周期分だけ日付を進める
    pub fn step(&self, date: NaiveDate) -> Option<NaiveDate> {
        advance(date, self.period, self.interval)
    }

    /// 日数が固定の周期（日・週）の場合、その日数を返す
    pub fn fixed_step_days(&self) -> Option<i64> {
        let interval = i64::from(self.interval);
        match self.period {
            BillingPeriod::Day => Some(interval),
            BillingPeriod::Week => Some(7 * interval),
            BillingPeriod::Month | BillingPeriod::Year => None,
        }
    }

    /// 1周期で進む最小の日数
    ///
    /// 月末の切り詰めを考慮しても、nか月は28n日以上、n年は365n日以上進む。
    pub fn min_step_days(&self) -> i64 {
        let interval = i64::from(self.interval);
        match self.period {
            BillingPeriod::Day => interval,
            BillingPeriod::Week => 7 * interval,
            BillingPeriod::Month => 28 * interval,
            BillingPeriod::Year => 365 * interval,
        }
    }
}

/// 日付を指定した周期分だけ進める
///
/// 月・年単位では、元の日が存在しない月に移る場合は月末日に切り詰める
/// （1月31日 + 1か月 = 2月28日または29日）。
///
/// # 戻り値
/// 進めた日付。暦の範囲を超える場合はNone
pub fn advance(date: NaiveDate, period: BillingPeriod, interval: u32) -> Option<NaiveDate> {
    match period {
        BillingPeriod::Day => date.checked_add_days(Days::new(u64::from(interval))),
        BillingPeriod::Week => date.checked_add_days(Days::new(7 * u64::from(interval))),
        BillingPeriod::Month => date.checked_add_months(Months::new(interval)),
        BillingPeriod::Year => interval
            .checked_mul(12)
            .and_then(|months| date.checked_add_months(Months::new(months))),
    }
}

/// 時刻部分を切り捨て、その地域での暦日に変換する
pub fn normalize_to_midnight<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.date_naive()
}

/// 日付を指定日数進める
pub fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

/// 月初日
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// 月末日
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    start_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next_month| next_month.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// 両端を含む日付範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// 開始日が終了日より後の場合は空
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
