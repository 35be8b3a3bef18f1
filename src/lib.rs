// 機能モジュール構造
pub mod features;
pub mod shared;

use features::dashboard::{service as dashboard_service, DashboardStats};
use features::settings::repository as settings_repository;
use features::subscriptions::repository as subscription_repository;
use log::info;
use rusqlite::Connection;
use shared::clock::{Clock, SystemClock};
use shared::config::{initialize_logging_system, load_environment_variables, EnvironmentConfig};
use shared::database::initialize_database;
use shared::errors::{AppError, AppResult};
use std::sync::{Mutex, MutexGuard};

/// 所有者IDを指定する環境変数
const OWNER_ID_ENV: &str = "DASHBOARD_OWNER_ID";

/// アプリケーション状態（データベース接続を保持）
pub struct AppState {
    pub db: Mutex<Connection>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// データベース接続をロックする
    ///
    /// # 戻り値
    /// ロック済みの接続、またはロックが汚染されている場合はエラーメッセージ
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, String> {
        self.db.lock().map_err(|e| {
            AppError::concurrency(format!("データベースロックエラー: {e}"))
                .log_and_message("データベースロック")
        })
    }
}

/// コマンドライン引数
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    owner_id: Option<String>,
    refresh: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> CliArgs {
    let mut parsed = CliArgs::default();
    for arg in args {
        if arg == "--refresh" {
            parsed.refresh = true;
        } else if parsed.owner_id.is_none() && !arg.trim().is_empty() {
            parsed.owner_id = Some(arg);
        }
    }
    parsed
}

/// 所有者のダッシュボードを集計する
///
/// `refresh`が真の場合、集計前に支払日を過ぎた次回支払日を繰り越す。
/// エラーは元の種類のまま返す。
fn build_dashboard(
    conn: &Connection,
    owner_id: &str,
    refresh: bool,
    clock: &dyn Clock,
    config: &EnvironmentConfig,
) -> AppResult<DashboardStats> {
    let settings = settings_repository::find_or_default(conn, owner_id, config)?;
    let today = settings.today(clock)?;

    if refresh {
        let updated = subscription_repository::advance_overdue_payment_dates(conn, owner_id, today)?;
        info!("次回支払日を繰り越しました: {updated} 件");
    }

    let subscriptions = subscription_repository::find_all(conn, owner_id, false)?;
    Ok(dashboard_service::compute_stats(
        &subscriptions,
        today,
        &settings.currency,
    ))
}

/// 所有者のダッシュボードを集計し、JSONとして標準出力に書き出す
///
/// 使い方: `subscription-tracker [owner_id] [--refresh]`
///
/// 所有者IDは引数、または環境変数`DASHBOARD_OWNER_ID`で指定する。
/// `--refresh`を付けると、集計前に支払日を過ぎた次回支払日を繰り越す。
pub fn run() -> AppResult<()> {
    // 環境に応じた.envファイルを読み込み（ログシステム初期化前に実行）
    load_environment_variables();
    initialize_logging_system();

    let config = EnvironmentConfig::from_env();
    config.validate()?;
    info!("アプリケーション初期化を開始します（環境: {}）", config.environment);

    let args = parse_args(std::env::args().skip(1));
    let owner_id = args
        .owner_id
        .or_else(|| std::env::var(OWNER_ID_ENV).ok())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            AppError::configuration(format!(
                "所有者IDを引数または{OWNER_ID_ENV}で指定してください"
            ))
        })?;

    let conn = initialize_database(&config)?;
    let stats = build_dashboard(&conn, &owner_id, args.refresh, &SystemClock, &config)?;

    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
