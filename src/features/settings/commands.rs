use super::models::{Settings, UpdateSettingsDto};
use super::repository;
use crate::shared::config::EnvironmentConfig;
use crate::shared::errors::AppResult;
use crate::shared::utils::{normalize_currency, parse_timezone};
use crate::AppState;

/// 設定を取得する（未保存の場合はデフォルト値）
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `owner_id` - 認証済みユーザーのID
/// * `config` - 環境設定（デフォルト値の取得元）
pub fn get_settings(
    state: &AppState,
    owner_id: &str,
    config: &EnvironmentConfig,
) -> Result<Settings, String> {
    let db = state.lock_db()?;

    repository::find_or_default(&db, owner_id, config)
        .map_err(|e| e.log_and_message("設定取得"))
}

/// デフォルト設定を作成する（既に存在する場合はそのまま返す）
pub fn create_settings(
    state: &AppState,
    owner_id: &str,
    config: &EnvironmentConfig,
) -> Result<Settings, String> {
    let db = state.lock_db()?;

    repository::insert_if_absent(
        &db,
        owner_id,
        &config.default_timezone,
        &config.default_currency,
    )
    .map_err(|e| e.log_and_message("設定作成"))
}

/// 設定を更新する（未保存の場合は作成する）
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `owner_id` - 認証済みユーザーのID
/// * `config` - 環境設定（未指定項目のデフォルト値）
/// * `dto` - 設定更新用DTO
///
/// # 戻り値
/// 更新後の設定、または失敗時はエラーメッセージ
pub fn update_settings(
    state: &AppState,
    owner_id: &str,
    config: &EnvironmentConfig,
    dto: UpdateSettingsDto,
) -> Result<Settings, String> {
    let db = state.lock_db()?;

    let current = repository::find_or_default(&db, owner_id, config)
        .map_err(|e| e.log_and_message("設定更新"))?;
    let (timezone, currency) =
        validate_update_settings_dto(&current, dto).map_err(|e| e.log_and_message("設定更新"))?;

    repository::upsert(&db, owner_id, &timezone, &currency)
        .map_err(|e| e.log_and_message("設定更新"))
}

/// 設定更新DTOのバリデーション
///
/// # 戻り値
/// 検証済みの（タイムゾーン名, 通貨コード）
fn validate_update_settings_dto(
    current: &Settings,
    dto: UpdateSettingsDto,
) -> AppResult<(String, String)> {
    let timezone = dto.timezone.unwrap_or_else(|| current.timezone.clone());
    let timezone = parse_timezone(&timezone)?.name().to_string();

    let currency = normalize_currency(dto.currency.as_deref().unwrap_or(&current.currency))?;

    Ok((timezone, currency))
}
