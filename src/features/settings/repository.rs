use super::models::Settings;
use crate::shared::config::EnvironmentConfig;
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

/// 保存済みの設定を取得する
///
/// # 戻り値
/// 設定、または未保存の場合はNone
pub fn find(conn: &Connection, owner_id: &str) -> AppResult<Option<Settings>> {
    let settings = conn
        .query_row(
            "SELECT owner_id, timezone, currency, created_at, updated_at
             FROM settings WHERE owner_id = ?1",
            params![owner_id],
            |row| {
                Ok(Settings {
                    owner_id: row.get(0)?,
                    timezone: row.get(1)?,
                    currency: row.get(2)?,
                    created_at: Some(row.get(3)?),
                    updated_at: Some(row.get(4)?),
                })
            },
        )
        .optional()?;

    Ok(settings)
}

/// 設定を取得する。未保存の場合はデフォルト値を返す
pub fn find_or_default(
    conn: &Connection,
    owner_id: &str,
    config: &EnvironmentConfig,
) -> AppResult<Settings> {
    Ok(find(conn, owner_id)?.unwrap_or_else(|| Settings::defaults(owner_id, config)))
}

/// 設定が無い場合のみ作成する
///
/// # 戻り値
/// 既存の設定、または新たに作成した設定
pub fn insert_if_absent(
    conn: &Connection,
    owner_id: &str,
    timezone: &str,
    currency: &str,
) -> AppResult<Settings> {
    let now = Utc::now();

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO settings (owner_id, timezone, currency, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![owner_id, timezone, currency, now, now],
    )?;

    if inserted > 0 {
        log::info!("デフォルト設定を作成しました: {owner_id}");
    }

    load(conn, owner_id)
}

/// 設定を作成または更新する
pub fn upsert(
    conn: &Connection,
    owner_id: &str,
    timezone: &str,
    currency: &str,
) -> AppResult<Settings> {
    let now = Utc::now();

    conn.execute(
        "INSERT INTO settings (owner_id, timezone, currency, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(owner_id) DO UPDATE SET
             timezone = excluded.timezone,
             currency = excluded.currency,
             updated_at = excluded.updated_at",
        params![owner_id, timezone, currency, now],
    )?;

    load(conn, owner_id)
}

/// 書き込み直後の設定を読み直す
fn load(conn: &Connection, owner_id: &str) -> AppResult<Settings> {
    find(conn, owner_id)?.ok_or_else(|| AppError::not_found("設定"))
}
