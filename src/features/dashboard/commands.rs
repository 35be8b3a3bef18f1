use super::models::{CalendarMonth, DashboardStats};
use super::service;
use crate::features::settings::repository as settings_repository;
use crate::features::subscriptions::repository as subscription_repository;
use crate::shared::clock::Clock;
use crate::shared::config::EnvironmentConfig;
use crate::AppState;

/// ダッシュボードの集計結果を取得する
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `owner_id` - 認証済みユーザーのID
/// * `clock` - 現在時刻の取得元（1回だけ読み取る）
/// * `config` - 環境設定（設定未保存時のデフォルト値）
///
/// # 戻り値
/// 集計結果、または失敗時はエラーメッセージ
pub fn get_dashboard_stats(
    state: &AppState,
    owner_id: &str,
    clock: &dyn Clock,
    config: &EnvironmentConfig,
) -> Result<DashboardStats, String> {
    let db = state.lock_db()?;

    let settings = settings_repository::find_or_default(&db, owner_id, config)
        .map_err(|e| e.log_and_message("ダッシュボード集計"))?;
    let today = settings
        .today(clock)
        .map_err(|e| e.log_and_message("ダッシュボード集計"))?;
    let subscriptions = subscription_repository::find_all(&db, owner_id, false)
        .map_err(|e| e.log_and_message("ダッシュボード集計"))?;

    log::info!(
        "ダッシュボードを集計します: {} 件 (基準日 {today}, {})",
        subscriptions.len(),
        settings.timezone
    );

    Ok(service::compute_stats(
        &subscriptions,
        today,
        &settings.currency,
    ))
}

/// 指定した月のカレンダーを取得する
pub fn get_calendar_month(
    state: &AppState,
    owner_id: &str,
    year: i32,
    month: u32,
    clock: &dyn Clock,
    config: &EnvironmentConfig,
) -> Result<CalendarMonth, String> {
    let db = state.lock_db()?;

    let settings = settings_repository::find_or_default(&db, owner_id, config)
        .map_err(|e| e.log_and_message("カレンダー取得"))?;
    let today = settings
        .today(clock)
        .map_err(|e| e.log_and_message("カレンダー取得"))?;
    let subscriptions = subscription_repository::find_all(&db, owner_id, false)
        .map_err(|e| e.log_and_message("カレンダー取得"))?;

    service::calendar_month(&subscriptions, year, month, today, &settings.currency)
        .map_err(|e| e.log_and_message("カレンダー取得"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::settings::{update_settings, UpdateSettingsDto};
    use crate::features::subscriptions::{create_subscription, CreateSubscriptionDto};
    use crate::shared::clock::FixedClock;
    use crate::shared::config::{DEFAULT_CURRENCY, DEFAULT_TIMEZONE};
    use crate::shared::database::create_tables;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rusqlite::Connection;

    fn test_state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        AppState::new(conn)
    }

    fn test_config() -> EnvironmentConfig {
        EnvironmentConfig {
            environment: "development".to_string(),
            debug_mode: true,
            log_level: "debug".to_string(),
            database_path: None,
            default_currency: DEFAULT_CURRENCY.to_string(),
            default_timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    fn netflix() -> CreateSubscriptionDto {
        CreateSubscriptionDto {
            name: "Netflix".to_string(),
            cost: 12.99,
            currency: "EUR".to_string(),
            billing_interval: 1,
            billing_period: "Month".to_string(),
            next_payment_date: "2025-10-04".to_string(),
            start_date: "2025-01-04".to_string(),
            category: Some("Streaming".to_string()),
            payment_method: None,
            end_date: None,
            url: None,
            notes: None,
            status: None,
        }
    }

    #[test]
    fn test_get_dashboard_stats_for_owner() {
        let state = test_state();
        let config = test_config();
        create_subscription(&state, "owner-1", netflix()).unwrap();

        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap());
        let stats = get_dashboard_stats(&state, "owner-1", &clock, &config).unwrap();

        assert_eq!(stats.currency, "EUR");
        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.due_this_calendar_month, 12.99);
        assert_eq!(stats.due_next_30_days.count, 1);

        // 他のユーザーには表示されない
        let other = get_dashboard_stats(&state, "owner-2", &clock, &config).unwrap();
        assert_eq!(other.currency, "HUF");
        assert_eq!(other.active_count, 0);
    }

    #[test]
    fn test_dashboard_uses_settings_currency_as_fallback() {
        let state = test_state();
        let config = test_config();
        update_settings(
            &state,
            "owner-1",
            &config,
            UpdateSettingsDto {
                timezone: None,
                currency: Some("USD".to_string()),
            },
        )
        .unwrap();

        let clock = FixedClock(Utc::now());
        let stats = get_dashboard_stats(&state, "owner-1", &clock, &config).unwrap();
        assert_eq!(stats.currency, "USD");
    }

    #[test]
    fn test_get_calendar_month() {
        let state = test_state();
        let config = test_config();
        create_subscription(&state, "owner-1", netflix()).unwrap();

        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap());
        let month = get_calendar_month(&state, "owner-1", 2025, 11, &clock, &config).unwrap();

        assert_eq!(month.days.len(), 1);
        assert_eq!(month.days[0].date, NaiveDate::from_ymd_opt(2025, 11, 4).unwrap());
        assert_eq!(month.remaining_due, 12.99);

        assert!(get_calendar_month(&state, "owner-1", 2025, 0, &clock, &config).is_err());
    }
}
