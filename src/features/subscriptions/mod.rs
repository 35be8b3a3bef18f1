/// サブスクリプション機能モジュール
///
/// このモジュールは、サブスクリプション管理に関連するすべての機能を提供します：
/// - サブスクリプションの作成、読み取り、更新、削除
/// - サブスクリプションの有効/無効切り替え
/// - 支払日を過ぎたサブスクリプションの次回支払日の繰り越し
pub mod commands;
pub mod models;
pub mod repository;
pub mod validation;

// 公開インターフェース
pub use commands::{
    create_subscription, delete_subscription, get_subscription, get_subscriptions,
    refresh_overdue_subscriptions, toggle_subscription_status, update_subscription,
};

pub use models::{
    CreateSubscriptionDto, Subscription, SubscriptionFields, SubscriptionStatus,
    UpdateSubscriptionDto,
};
