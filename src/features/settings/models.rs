use crate::features::projection::normalize_to_midnight;
use crate::shared::clock::Clock;
use crate::shared::config::EnvironmentConfig;
use crate::shared::errors::AppResult;
use crate::shared::utils::parse_timezone;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// ユーザーごとの表示設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub owner_id: String,
    pub timezone: String, // IANAタイムゾーン名
    pub currency: String, // 3文字の通貨コード（大文字）
    pub created_at: Option<DateTime<Utc>>, // 未保存（デフォルト値）の場合はNone
    pub updated_at: Option<DateTime<Utc>>,
}

impl Settings {
    /// 環境設定のデフォルト値から設定を作成する
    pub fn defaults(owner_id: &str, config: &EnvironmentConfig) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            timezone: config.default_timezone.clone(),
            currency: config.default_currency.clone(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn tz(&self) -> AppResult<Tz> {
        parse_timezone(&self.timezone)
    }

    /// このユーザーのタイムゾーンでの「今日」
    pub fn today(&self, clock: &dyn Clock) -> AppResult<NaiveDate> {
        let tz = self.tz()?;
        Ok(normalize_to_midnight(&clock.now().with_timezone(&tz)))
    }
}

/// 設定更新用DTO
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsDto {
    pub timezone: Option<String>,
    pub currency: Option<String>,
}
