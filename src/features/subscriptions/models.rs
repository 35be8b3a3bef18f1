use crate::features::projection::{BillingPeriod, Cadence};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// サブスクリプションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(SubscriptionStatus::Active),
            "inactive" => Some(SubscriptionStatus::Inactive),
            _ => None,
        }
    }

    /// 反対の状態
    pub fn toggled(&self) -> Self {
        match self {
            SubscriptionStatus::Active => SubscriptionStatus::Inactive,
            SubscriptionStatus::Inactive => SubscriptionStatus::Active,
        }
    }
}

/// サブスクリプションデータモデル
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Subscription {
    pub id: i64,
    pub owner_id: String,
    pub name: String,                       // サービス名、100文字以内
    pub cost: Option<f64>,                  // 未設定の場合は集計上0として扱う
    pub currency: String,                   // 3文字の通貨コード（大文字）
    pub billing_interval: i64,              // 1以上
    pub billing_period: BillingPeriod,      // Day / Week / Month / Year
    pub next_payment_date: Option<NaiveDate>, // 支払い日の起点
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,        // この日を含む
    pub url: Option<String>,
    pub notes: Option<String>,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// 支払い周期
    ///
    /// 保存された間隔が1未満の場合はNone
    pub fn cadence(&self) -> Option<Cadence> {
        u32::try_from(self.billing_interval)
            .ok()
            .and_then(|interval| Cadence::new(interval, self.billing_period))
    }

    /// 集計に使う金額（未設定・非有限・負の値は0）
    pub fn cost_value(&self) -> f64 {
        self.cost
            .filter(|cost| cost.is_finite() && *cost >= 0.0)
            .unwrap_or(0.0)
    }
}

/// サブスクリプション作成用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionDto {
    pub name: String,
    pub cost: f64,
    pub currency: String,
    pub billing_interval: i64,
    pub billing_period: String,
    pub next_payment_date: String, // YYYY-MM-DD形式
    pub start_date: String,        // YYYY-MM-DD形式
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub end_date: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>, // 省略時は"active"
}

/// サブスクリプション更新用DTO
///
/// 任意項目（カテゴリ・支払い方法・終了日・URL・メモ）は空文字列でクリアする。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSubscriptionDto {
    pub name: Option<String>,
    pub cost: Option<f64>,
    pub currency: Option<String>,
    pub billing_interval: Option<i64>,
    pub billing_period: Option<String>,
    pub next_payment_date: Option<String>,
    pub start_date: Option<String>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub end_date: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

/// 検証済みのサブスクリプション項目
///
/// リポジトリへの書き込みはこの型を経由する。
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionFields {
    pub name: String,
    pub cost: f64,
    pub currency: String,
    pub cadence: Cadence,
    pub next_payment_date: NaiveDate,
    pub start_date: NaiveDate,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub status: SubscriptionStatus,
}
