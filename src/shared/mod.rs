/// 共有エラー型とエラーハンドリング
pub mod errors;

/// 共有データベース接続管理
pub mod database;

/// 共有設定管理
pub mod config;

/// 時刻の取得元
pub mod clock;

/// 共有ユーティリティ関数
pub mod utils;

// 便利な再エクスポート
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    initialize_logging_system, load_environment_variables, Environment, EnvironmentConfig,
};
pub use database::{create_tables, get_database_path, initialize_database};
pub use errors::{AppError, AppResult, ErrorSeverity};
