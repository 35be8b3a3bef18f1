use super::models::{CreateSubscriptionDto, Subscription, UpdateSubscriptionDto};
use super::repository;
use super::validation::{merge_update_subscription_dto, validate_create_subscription_dto};
use crate::features::settings::repository as settings_repository;
use crate::shared::clock::Clock;
use crate::shared::config::EnvironmentConfig;
use crate::AppState;

/// サブスクリプションを作成する
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `owner_id` - 認証済みユーザーのID
/// * `dto` - サブスクリプション作成用DTO
///
/// # 戻り値
/// 作成されたサブスクリプション、または失敗時はエラーメッセージ
pub fn create_subscription(
    state: &AppState,
    owner_id: &str,
    dto: CreateSubscriptionDto,
) -> Result<Subscription, String> {
    // バリデーション
    let fields = validate_create_subscription_dto(dto)
        .map_err(|e| e.log_and_message("サブスクリプション作成"))?;

    let db = state.lock_db()?;

    repository::create(&db, &fields, owner_id)
        .map_err(|e| e.log_and_message("サブスクリプション作成"))
}

/// サブスクリプション一覧を取得する（作成日時の新しい順）
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `owner_id` - 認証済みユーザーのID
/// * `active_only` - 状態がactiveのもののみを取得するか
pub fn get_subscriptions(
    state: &AppState,
    owner_id: &str,
    active_only: bool,
) -> Result<Vec<Subscription>, String> {
    let db = state.lock_db()?;

    repository::find_all(&db, owner_id, active_only)
        .map_err(|e| e.log_and_message("サブスクリプション一覧取得"))
}

/// サブスクリプションを1件取得する
pub fn get_subscription(state: &AppState, owner_id: &str, id: i64) -> Result<Subscription, String> {
    let db = state.lock_db()?;

    repository::find_by_id(&db, id, owner_id)
        .map_err(|e| e.log_and_message("サブスクリプション取得"))
}

/// サブスクリプションを更新する
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `owner_id` - 認証済みユーザーのID
/// * `id` - サブスクリプションID
/// * `dto` - サブスクリプション更新用DTO
///
/// # 戻り値
/// 更新されたサブスクリプション、または失敗時はエラーメッセージ
pub fn update_subscription(
    state: &AppState,
    owner_id: &str,
    id: i64,
    dto: UpdateSubscriptionDto,
) -> Result<Subscription, String> {
    let db = state.lock_db()?;

    // 既存の値と重ねてから検証する
    let existing = repository::find_by_id(&db, id, owner_id)
        .map_err(|e| e.log_and_message("サブスクリプション更新"))?;
    let fields = merge_update_subscription_dto(&existing, dto)
        .map_err(|e| e.log_and_message("サブスクリプション更新"))?;

    repository::update(&db, id, &fields, owner_id)
        .map_err(|e| e.log_and_message("サブスクリプション更新"))
}

/// サブスクリプションを削除する
pub fn delete_subscription(state: &AppState, owner_id: &str, id: i64) -> Result<(), String> {
    let db = state.lock_db()?;

    repository::delete(&db, id, owner_id)
        .map_err(|e| e.log_and_message("サブスクリプション削除"))
}

/// サブスクリプションの状態（active/inactive）を切り替える
pub fn toggle_subscription_status(
    state: &AppState,
    owner_id: &str,
    id: i64,
) -> Result<Subscription, String> {
    let db = state.lock_db()?;

    repository::toggle_status(&db, id, owner_id)
        .map_err(|e| e.log_and_message("サブスクリプション状態切り替え"))
}

/// 支払日を過ぎたサブスクリプションの次回支払日を繰り越す
///
/// 「今日」はユーザー設定のタイムゾーンで決まる。
///
/// # 戻り値
/// 更新した件数、または失敗時はエラーメッセージ
pub fn refresh_overdue_subscriptions(
    state: &AppState,
    owner_id: &str,
    clock: &dyn Clock,
    config: &EnvironmentConfig,
) -> Result<usize, String> {
    let db = state.lock_db()?;

    let settings = settings_repository::find_or_default(&db, owner_id, config)
        .map_err(|e| e.log_and_message("次回支払日の繰り越し"))?;
    let today = settings
        .today(clock)
        .map_err(|e| e.log_and_message("次回支払日の繰り越し"))?;

    repository::advance_overdue_payment_dates(&db, owner_id, today)
        .map_err(|e| e.log_and_message("次回支払日の繰り越し"))
}
