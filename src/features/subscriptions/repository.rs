use super::models::{Subscription, SubscriptionFields, SubscriptionStatus};
use crate::features::projection::{first_occurrence_on_or_after, BillingPeriod};
use crate::shared::errors::{AppError, AppResult};
use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

/// SELECT句で取得するカラム（`map_row`の列順と一致させる）
const SELECT_COLUMNS: &str = "id, owner_id, name, cost, currency, billing_interval, billing_period,
     next_payment_date, category, payment_method, start_date, end_date, url, notes, status,
     created_at, updated_at";

/// 行データをサブスクリプションに変換する
fn map_row(row: &Row) -> rusqlite::Result<Subscription> {
    let period: String = row.get(6)?;
    let billing_period = BillingPeriod::parse(&period).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            format!("不明な支払い周期です: {period}").into(),
        )
    })?;

    let status: String = row.get(14)?;
    let status = SubscriptionStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            14,
            Type::Text,
            format!("不明な状態です: {status}").into(),
        )
    })?;

    Ok(Subscription {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        cost: row.get(3)?,
        currency: row.get(4)?,
        billing_interval: row.get(5)?,
        billing_period,
        next_payment_date: row.get(7)?,
        category: row.get(8)?,
        payment_method: row.get(9)?,
        start_date: row.get(10)?,
        end_date: row.get(11)?,
        url: row.get(12)?,
        notes: row.get(13)?,
        status,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("ID {id} のサブスクリプションが見つかりません"))
}

/// サブスクリプションを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `fields` - 検証済みのサブスクリプション項目
/// * `owner_id` - 所有者ID
///
/// # 戻り値
/// 作成されたサブスクリプション、または失敗時はエラー
pub fn create(
    conn: &Connection,
    fields: &SubscriptionFields,
    owner_id: &str,
) -> AppResult<Subscription> {
    let now = Utc::now();

    conn.execute(
        "INSERT INTO subscriptions (owner_id, name, cost, currency, billing_interval, billing_period,
             next_payment_date, category, payment_method, start_date, end_date, url, notes, status,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            owner_id,
            fields.name,
            fields.cost,
            fields.currency,
            i64::from(fields.cadence.interval()),
            fields.cadence.period().as_str(),
            fields.next_payment_date,
            fields.category,
            fields.payment_method,
            fields.start_date,
            fields.end_date,
            fields.url,
            fields.notes,
            fields.status.as_str(),
            now,
            now
        ],
    )?;

    let id = conn.last_insert_rowid();
    log::info!("サブスクリプションを作成しました: ID {id}");

    find_by_id(conn, id, owner_id)
}

/// IDでサブスクリプションを取得する
///
/// # 戻り値
/// サブスクリプション、または存在しない場合はNotFoundエラー
pub fn find_by_id(conn: &Connection, id: i64, owner_id: &str) -> AppResult<Subscription> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM subscriptions WHERE id = ?1 AND owner_id = ?2"),
        params![id, owner_id],
        map_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => not_found(id),
        _ => AppError::Database(e.to_string()),
    })
}

/// 所有者のサブスクリプション一覧を取得する（作成日時の新しい順）
///
/// # 引数
/// * `conn` - データベース接続
/// * `owner_id` - 所有者ID
/// * `active_only` - 状態がactiveのもののみを取得するか
///
/// # 戻り値
/// サブスクリプションのリスト、または失敗時はエラー
pub fn find_all(
    conn: &Connection,
    owner_id: &str,
    active_only: bool,
) -> AppResult<Vec<Subscription>> {
    let query = if active_only {
        format!(
            "SELECT {SELECT_COLUMNS} FROM subscriptions
             WHERE owner_id = ?1 AND status = 'active' ORDER BY created_at DESC, id DESC"
        )
    } else {
        format!(
            "SELECT {SELECT_COLUMNS} FROM subscriptions
             WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC"
        )
    };

    let mut stmt = conn.prepare(&query)?;
    let subscriptions = stmt.query_map([owner_id], map_row)?;

    subscriptions
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))
}

/// サブスクリプションを更新する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - サブスクリプションID
/// * `fields` - 既存の値と更新内容を合わせた検証済みの項目
/// * `owner_id` - 所有者ID
///
/// # 戻り値
/// 更新されたサブスクリプション、または失敗時はエラー
pub fn update(
    conn: &Connection,
    id: i64,
    fields: &SubscriptionFields,
    owner_id: &str,
) -> AppResult<Subscription> {
    let now = Utc::now();

    let rows_affected = conn.execute(
        "UPDATE subscriptions
         SET name = ?1, cost = ?2, currency = ?3, billing_interval = ?4, billing_period = ?5,
             next_payment_date = ?6, category = ?7, payment_method = ?8, start_date = ?9,
             end_date = ?10, url = ?11, notes = ?12, status = ?13, updated_at = ?14
         WHERE id = ?15 AND owner_id = ?16",
        params![
            fields.name,
            fields.cost,
            fields.currency,
            i64::from(fields.cadence.interval()),
            fields.cadence.period().as_str(),
            fields.next_payment_date,
            fields.category,
            fields.payment_method,
            fields.start_date,
            fields.end_date,
            fields.url,
            fields.notes,
            fields.status.as_str(),
            now,
            id,
            owner_id
        ],
    )?;

    if rows_affected == 0 {
        return Err(not_found(id));
    }

    find_by_id(conn, id, owner_id)
}

/// サブスクリプションの状態（active/inactive）を切り替える
pub fn toggle_status(conn: &Connection, id: i64, owner_id: &str) -> AppResult<Subscription> {
    let now = Utc::now();

    let rows_affected = conn.execute(
        "UPDATE subscriptions
         SET status = CASE status WHEN 'active' THEN 'inactive' ELSE 'active' END, updated_at = ?1
         WHERE id = ?2 AND owner_id = ?3",
        params![now, id, owner_id],
    )?;

    if rows_affected == 0 {
        return Err(not_found(id));
    }

    find_by_id(conn, id, owner_id)
}

/// サブスクリプションを削除する
///
/// # 戻り値
/// 成功時はOk(())、存在しない場合はNotFoundエラー
pub fn delete(conn: &Connection, id: i64, owner_id: &str) -> AppResult<()> {
    let rows_affected = conn.execute(
        "DELETE FROM subscriptions WHERE id = ?1 AND owner_id = ?2",
        params![id, owner_id],
    )?;

    if rows_affected == 0 {
        return Err(not_found(id));
    }

    log::info!("サブスクリプションを削除しました: ID {id}");
    Ok(())
}

/// 支払日を過ぎたサブスクリプションの次回支払日を繰り越す
///
/// 各サブスクリプション自身の支払い周期で、`today`以降の最初の支払日に移動する。
/// 終了日を過ぎているもの、繰り越し先が終了日を超えるものは変更しない。
///
/// # 戻り値
/// 更新した件数
pub fn advance_overdue_payment_dates(
    conn: &Connection,
    owner_id: &str,
    today: NaiveDate,
) -> AppResult<usize> {
    let subscriptions = find_all(conn, owner_id, false)?;
    let now = Utc::now();
    let tx = conn.unchecked_transaction()?;
    let mut updated = 0;

    for subscription in &subscriptions {
        let Some(next_payment_date) = subscription.next_payment_date else {
            continue;
        };
        if next_payment_date >= today || subscription.end_date.is_some_and(|end| end < today) {
            continue;
        }

        let Some(cadence) = subscription.cadence() else {
            log::warn!(
                "支払い間隔が不正なため繰り越しをスキップします: ID {} (間隔 {})",
                subscription.id,
                subscription.billing_interval
            );
            continue;
        };

        match first_occurrence_on_or_after(cadence, next_payment_date, subscription.end_date, today)
        {
            Some(rolled) => {
                tx.execute(
                    "UPDATE subscriptions SET next_payment_date = ?1, updated_at = ?2
                     WHERE id = ?3 AND owner_id = ?4",
                    params![rolled, now, subscription.id, owner_id],
                )?;
                log::debug!(
                    "次回支払日を繰り越しました: ID {} {} -> {}",
                    subscription.id,
                    next_payment_date,
                    rolled
                );
                updated += 1;
            }
            None => log::debug!(
                "繰り越し先が終了日を超えるため変更しません: ID {}",
                subscription.id
            ),
        }
    }

    tx.commit()?;

    if updated > 0 {
        log::info!("{updated} 件のサブスクリプションの次回支払日を更新しました");
    }

    Ok(updated)
}
