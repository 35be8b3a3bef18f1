/// ダッシュボード機能モジュール
///
/// 保存済みのサブスクリプションから支払い予定を予測し、集計する：
/// - 今月・来月の支払い予定額
/// - 今後30日間の更新予定
/// - 12か月間の支払い予測（月別・カテゴリ別）
/// - 月別のカレンダー
pub mod commands;
pub mod models;
pub mod service;

pub use commands::{get_calendar_month, get_dashboard_stats};
pub use models::{
    CalendarDay, CalendarEntry, CalendarMonth, CategorySpending, DashboardStats, MonthlyBucket,
    Renewal, RenewalSummary,
};
pub use service::{calendar_month, compute_stats};
