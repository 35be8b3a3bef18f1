use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Datelike, NaiveDate};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// ISO 4217形式の通貨コード（大文字小文字は問わない）
static CURRENCY_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{3}$").expect("通貨コードの正規表現が不正です")
});

/// 日付文字列を解析する
///
/// # 引数
/// * `date_str` - 日付文字列（YYYY-MM-DD形式、またはRFC3339形式）
///
/// # 戻り値
/// 解析された日付、または無効な場合はエラー
///
/// # バリデーション規則
/// - YYYY-MM-DD形式、またはRFC3339形式（日付部分を使用）であること
/// - 実在する日付であること
/// - 1900年以降、2100年以前であること
pub fn parse_date(date_str: &str) -> AppResult<NaiveDate> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("日付が空です"));
    }

    let date = match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.date_naive())
            .map_err(|_| {
                AppError::validation(format!(
                    "日付はYYYY-MM-DD形式で入力してください（受信: '{trimmed}'）"
                ))
            })?,
    };

    if !(1900..=2100).contains(&date.year()) {
        return Err(AppError::validation(
            "日付は1900年から2100年の間で入力してください",
        ));
    }

    Ok(date)
}

/// 金額のバリデーション
///
/// # バリデーション規則
/// - 有限の正の数値であること
/// - 10桁以内であること
/// - 小数点以下は2桁まで
pub fn validate_amount(amount: f64) -> AppResult<()> {
    if !amount.is_finite() {
        return Err(AppError::validation("無効な金額です"));
    }

    if amount <= 0.0 {
        return Err(AppError::validation("金額は正の数値で入力してください"));
    }

    if amount >= 10_000_000_000.0 {
        return Err(AppError::validation("金額は10桁以内で入力してください"));
    }

    let amount_str = format!("{amount:.10}");
    if let Some(decimal_pos) = amount_str.find('.') {
        let significant_decimals = amount_str[decimal_pos + 1..].trim_end_matches('0');
        if significant_decimals.len() > 2 {
            return Err(AppError::validation(
                "金額は小数点以下2桁まで入力してください",
            ));
        }
    }

    Ok(())
}

/// 文字列の長さバリデーション
pub fn validate_text_length(text: &str, max_length: usize, field_name: &str) -> AppResult<()> {
    let char_count = text.chars().count();
    if char_count > max_length {
        return Err(AppError::validation(format!(
            "{field_name}は{max_length}文字以内で入力してください（現在: {char_count}文字）"
        )));
    }
    Ok(())
}

/// 必須フィールドのバリデーション
pub fn validate_required_field(text: &str, field_name: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::validation(format!("{field_name}は必須項目です")));
    }
    Ok(())
}

/// 通貨コードを検証し、大文字に正規化する
///
/// # 引数
/// * `code` - 通貨コード（例: "huf", "EUR"）
///
/// # 戻り値
/// 大文字の3文字通貨コード、または無効な場合はエラー
pub fn normalize_currency(code: &str) -> AppResult<String> {
    let trimmed = code.trim();
    if !CURRENCY_CODE.is_match(trimmed) {
        return Err(AppError::validation(
            "通貨は3文字のコードで入力してください（例: HUF, EUR, USD）",
        ));
    }
    Ok(trimmed.to_uppercase())
}

/// タイムゾーン名を解析する
///
/// # 引数
/// * `name` - IANAタイムゾーン名（例: "Europe/Budapest"）
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("タイムゾーンは必須項目です"));
    }
    trimmed
        .parse::<Tz>()
        .map_err(|_| AppError::validation(format!("不明なタイムゾーンです: {trimmed}")))
}

/// サービスURLのバリデーション
///
/// 空文字列は「URLなし」として許可する。
pub fn validate_service_url(url: &str) -> AppResult<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    let parsed = Url::parse(trimmed).map_err(|_| AppError::validation("無効なURL形式です"))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        _ => Err(AppError::validation(
            "URLはhttpまたはhttps形式である必要があります",
        )),
    }
}

/// 任意項目の文字列を正規化する（空白のみの場合はNone）
pub fn normalize_optional(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-10-04").unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 4).unwrap()
        );
        // RFC3339形式は日付部分を使用
        assert_eq!(
            parse_date("2025-10-04T00:00:00.000Z").unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 4).unwrap()
        );
        assert!(parse_date("2024-02-29").is_ok()); // うるう年

        assert!(parse_date("").is_err());
        assert!(parse_date("2023-02-29").is_err()); // 非うるう年
        assert!(parse_date("2024/01/01").is_err());
        assert!(parse_date("1899-12-31").is_err());
        assert!(parse_date("2101-01-01").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(12.99).is_ok());
        assert!(validate_amount(0.01).is_ok());
        assert!(validate_amount(9999999999.0).is_ok());

        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-1.0).is_err());
        assert!(validate_amount(10000000000.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
        assert!(validate_amount(1.234).is_err());
    }

    #[test]
    fn test_validate_text_length() {
        assert!(validate_text_length("Netflix", 100, "サービス名").is_ok());
        assert!(validate_text_length(&"a".repeat(101), 100, "サービス名").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        assert!(validate_required_field("  Spotify  ", "サービス名").is_ok());
        assert!(validate_required_field("   ", "サービス名").is_err());
    }

    #[test]
    fn test_normalize_currency() {
        assert_eq!(normalize_currency("huf").unwrap(), "HUF");
        assert_eq!(normalize_currency(" EUR ").unwrap(), "EUR");

        assert!(normalize_currency("EURO").is_err());
        assert!(normalize_currency("E1R").is_err());
        assert!(normalize_currency("").is_err());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(
            parse_timezone("Europe/Budapest").unwrap(),
            chrono_tz::Europe::Budapest
        );
        assert!(parse_timezone("Mars/Olympus").is_err());
        assert!(parse_timezone(" ").is_err());
    }

    #[test]
    fn test_validate_service_url() {
        assert!(validate_service_url("").is_ok());
        assert!(validate_service_url("https://www.netflix.com/account").is_ok());
        assert!(validate_service_url("http://localhost:8080").is_ok());

        assert!(validate_service_url("netflix.com").is_err());
        assert!(validate_service_url("ftp://example.com").is_err());
        assert!(validate_service_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some("   ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" Streaming ".to_string())),
            Some("Streaming".to_string())
        );
    }
}
