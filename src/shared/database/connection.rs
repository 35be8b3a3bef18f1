use crate::shared::config::{get_database_filename, EnvironmentConfig};
use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::PathBuf;

/// データディレクトリ配下のアプリケーションフォルダ名
const APP_DIR_NAME: &str = "subscription-tracker";

/// データベース接続を初期化し、テーブルを作成する
///
/// # 引数
/// * `config` - 環境設定
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
///
/// # 処理内容
/// 1. データベースファイルパスの決定（必要ならディレクトリを作成）
/// 2. データベース接続の開設
/// 3. テーブルとインデックスの作成（既存の場合はそのまま）
pub fn initialize_database(config: &EnvironmentConfig) -> AppResult<Connection> {
    let database_path = get_database_path(config)?;

    let conn = Connection::open(&database_path)?;

    create_tables(&conn)?;

    log::info!("データベースを初期化しました: {:?}", database_path);

    Ok(conn)
}

/// データベースファイルパスを取得する
///
/// `DATABASE_PATH` が設定されていればそれを使用し、
/// 無ければOSのデータディレクトリ配下に環境別のファイル名で配置する。
pub fn get_database_path(config: &EnvironmentConfig) -> AppResult<PathBuf> {
    let database_path = match &config.database_path {
        Some(path) => path.clone(),
        None => {
            let data_dir = dirs::data_dir().ok_or_else(|| {
                AppError::configuration("データディレクトリの取得に失敗しました")
            })?;
            data_dir
                .join(APP_DIR_NAME)
                .join(get_database_filename(config.environment_kind()))
        }
    };

    // 親ディレクトリが存在しない場合は作成
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            log::info!("データディレクトリを作成: {:?}", parent);
        }
    }

    Ok(database_path)
}

/// データベーステーブルを作成する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    create_subscriptions_table(conn)?;
    create_indexes(conn)?;
    create_settings_table(conn)?;

    log::info!("テーブルを確認しました");

    Ok(())
}

/// サブスクリプションテーブルを作成する
fn create_subscriptions_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL,
            cost REAL,
            currency TEXT NOT NULL,
            billing_interval INTEGER NOT NULL DEFAULT 1 CHECK(billing_interval >= 1),
            billing_period TEXT NOT NULL CHECK(billing_period IN ('Day', 'Week', 'Month', 'Year')),
            next_payment_date TEXT,
            category TEXT,
            payment_method TEXT,
            start_date TEXT NOT NULL,
            end_date TEXT,
            url TEXT,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'inactive')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_owner ON subscriptions(owner_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_next_payment ON subscriptions(next_payment_date)",
        [],
    )?;

    Ok(())
}

/// ユーザー設定テーブルを作成する
fn create_settings_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            owner_id TEXT PRIMARY KEY,
            timezone TEXT NOT NULL,
            currency TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}
