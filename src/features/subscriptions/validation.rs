use super::models::{
    CreateSubscriptionDto, Subscription, SubscriptionFields, SubscriptionStatus,
    UpdateSubscriptionDto,
};
use crate::features::projection::{BillingPeriod, Cadence};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{
    normalize_currency, normalize_optional, parse_date, validate_amount, validate_required_field,
    validate_service_url, validate_text_length,
};
use chrono::NaiveDate;

/// サービス名の最大文字数
const NAME_MAX_LENGTH: usize = 100;

/// サブスクリプション作成DTOを検証し、保存用の項目に変換する
///
/// # 引数
/// * `dto` - サブスクリプション作成用DTO
///
/// # 戻り値
/// 検証済みの項目、または無効な場合はバリデーションエラー
pub fn validate_create_subscription_dto(dto: CreateSubscriptionDto) -> AppResult<SubscriptionFields> {
    log::debug!("サブスクリプション作成のバリデーション開始: {}", dto.name);

    let start_date = parse_date(&dto.start_date)?;
    let end_date = parse_optional_date(dto.end_date)?;
    check_date_order(start_date, end_date)?;

    Ok(SubscriptionFields {
        name: validate_name(&dto.name)?,
        cost: validate_cost(dto.cost)?,
        currency: normalize_currency(&dto.currency)?,
        cadence: parse_cadence(dto.billing_interval, &dto.billing_period)?,
        next_payment_date: parse_date(&dto.next_payment_date)?,
        start_date,
        category: normalize_optional(dto.category),
        payment_method: normalize_optional(dto.payment_method),
        end_date,
        url: parse_optional_url(dto.url)?,
        notes: normalize_optional(dto.notes),
        status: match dto.status {
            Some(status) => parse_status(&status)?,
            None => SubscriptionStatus::Active,
        },
    })
}

/// 既存のサブスクリプションに更新DTOを重ね、結果全体を検証する
///
/// 指定されなかった項目は既存の値を引き継ぐ。任意項目は空文字列でクリアされる。
pub fn merge_update_subscription_dto(
    existing: &Subscription,
    dto: UpdateSubscriptionDto,
) -> AppResult<SubscriptionFields> {
    let name = match dto.name {
        Some(name) => validate_name(&name)?,
        None => existing.name.clone(),
    };

    let cost = match dto.cost.or(existing.cost) {
        Some(cost) => validate_cost(cost)?,
        None => return Err(AppError::validation("金額は必須項目です")),
    };

    let currency = normalize_currency(dto.currency.as_deref().unwrap_or(&existing.currency))?;

    let interval = dto.billing_interval.unwrap_or(existing.billing_interval);
    let cadence = match dto.billing_period {
        Some(period) => parse_cadence(interval, &period)?,
        None => parse_cadence(interval, existing.billing_period.as_str())?,
    };

    let next_payment_date = match (dto.next_payment_date, existing.next_payment_date) {
        (Some(date), _) => parse_date(&date)?,
        (None, Some(date)) => date,
        (None, None) => return Err(AppError::validation("次回支払日は必須項目です")),
    };

    let start_date = match dto.start_date {
        Some(date) => parse_date(&date)?,
        None => existing.start_date,
    };

    let end_date = match dto.end_date {
        Some(date) => parse_optional_date(Some(date))?,
        None => existing.end_date,
    };
    check_date_order(start_date, end_date)?;

    let url = match dto.url {
        Some(url) => parse_optional_url(Some(url))?,
        None => existing.url.clone(),
    };

    let status = match dto.status {
        Some(status) => parse_status(&status)?,
        None => existing.status,
    };

    Ok(SubscriptionFields {
        name,
        cost,
        currency,
        cadence,
        next_payment_date,
        start_date,
        category: merge_text(dto.category, &existing.category),
        payment_method: merge_text(dto.payment_method, &existing.payment_method),
        end_date,
        url,
        notes: merge_text(dto.notes, &existing.notes),
        status,
    })
}

fn validate_name(name: &str) -> AppResult<String> {
    validate_required_field(name, "サービス名")?;
    let trimmed = name.trim();
    validate_text_length(trimmed, NAME_MAX_LENGTH, "サービス名")?;
    Ok(trimmed.to_string())
}

fn validate_cost(cost: f64) -> AppResult<f64> {
    validate_amount(cost)?;
    Ok(cost)
}

/// 支払い間隔と周期単位を検証する
fn parse_cadence(interval: i64, period: &str) -> AppResult<Cadence> {
    let period = BillingPeriod::parse(period).ok_or_else(|| {
        AppError::validation("支払い周期はDay, Week, Month, Yearのいずれかである必要があります")
    })?;

    u32::try_from(interval)
        .ok()
        .and_then(|interval| Cadence::new(interval, period))
        .ok_or_else(|| AppError::validation("支払い間隔は1以上の整数で入力してください"))
}

fn parse_status(status: &str) -> AppResult<SubscriptionStatus> {
    SubscriptionStatus::parse(status).ok_or_else(|| {
        AppError::validation("状態は'active'または'inactive'である必要があります")
    })
}

fn parse_optional_date(date: Option<String>) -> AppResult<Option<NaiveDate>> {
    normalize_optional(date).map(|d| parse_date(&d)).transpose()
}

fn parse_optional_url(url: Option<String>) -> AppResult<Option<String>> {
    let url = normalize_optional(url);
    if let Some(ref value) = url {
        validate_service_url(value)?;
    }
    Ok(url)
}

/// 終了日は開始日以降であること
fn check_date_order(start_date: NaiveDate, end_date: Option<NaiveDate>) -> AppResult<()> {
    match end_date {
        Some(end) if end < start_date => Err(AppError::validation(
            "終了日は開始日以降の日付を入力してください",
        )),
        _ => Ok(()),
    }
}

fn merge_text(update: Option<String>, existing: &Option<String>) -> Option<String> {
    match update {
        Some(text) => normalize_optional(Some(text)),
        None => existing.clone(),
    }
}
