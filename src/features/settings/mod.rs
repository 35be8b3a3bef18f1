/// ユーザー設定機能モジュール
///
/// タイムゾーン（「今日」の判定に使用）と表示通貨を所有者ごとに保存する。
pub mod commands;
pub mod models;
pub mod repository;

pub use commands::{create_settings, get_settings, update_settings};
pub use models::{Settings, UpdateSettingsDto};
