use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{normalize_currency, parse_timezone};
use std::path::PathBuf;

/// 設定が無い場合に使用する表示通貨
pub const DEFAULT_CURRENCY: &str = "HUF";

/// 設定が無い場合に使用するタイムゾーン
pub const DEFAULT_TIMEZONE: &str = "Europe/Budapest";

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// デバッグモードの有効/無効
    pub debug_mode: bool,
    /// ログレベル
    pub log_level: String,
    /// データベースファイルパス（未指定時はデータディレクトリを使用）
    pub database_path: Option<PathBuf>,
    /// ユーザー設定が無い場合の表示通貨
    pub default_currency: String,
    /// ユーザー設定が無い場合のタイムゾーン
    pub default_timezone: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 戻り値
    /// 環境設定
    pub fn from_env() -> Self {
        let environment = get_environment();
        let debug_mode = environment == Environment::Development;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if debug_mode {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        let database_path = std::env::var("DATABASE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let default_currency = std::env::var("DEFAULT_CURRENCY")
            .ok()
            .filter(|c| !c.trim().is_empty())
            .map(|c| c.trim().to_uppercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let default_timezone = std::env::var("DEFAULT_TIMEZONE")
            .ok()
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            debug_mode,
            log_level,
            database_path,
            default_currency,
            default_timezone,
        }
    }

    /// プロダクション環境かどうかを判定
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// デフォルトの通貨とタイムゾーンを検証する
    ///
    /// # 戻り値
    /// 成功時はOk(())、不正な値の場合は設定エラー
    pub fn validate(&self) -> AppResult<()> {
        normalize_currency(&self.default_currency).map_err(|e| {
            AppError::configuration(format!("DEFAULT_CURRENCY: {}", e.user_message()))
        })?;
        parse_timezone(&self.default_timezone).map_err(|e| {
            AppError::configuration(format!("DEFAULT_TIMEZONE: {}", e.user_message()))
        })?;

        Ok(())
    }

    /// 実行環境を列挙型で取得する
    pub fn environment_kind(&self) -> Environment {
        if self.is_production() {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

/// 現在の実行環境を判定する
///
/// # 戻り値
/// 現在の実行環境（Development または Production）
///
/// # 判定ロジック
/// 1. 実行時環境変数 ENVIRONMENT を確認
/// 2. デバッグビルドの場合は Development
/// 3. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = match env_var.as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    // フォールバック: ビルド設定に基づく判定
    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # ファイル名の規則
/// - 開発環境: "dev_subscriptions.db"
/// - プロダクション環境: "subscriptions.db"
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_subscriptions.db",
        Environment::Production => "subscriptions.db",
    }
}

/// 環境に応じた.envファイルを読み込む
///
/// # 処理内容
/// 1. ENVIRONMENT から読み込み対象ファイルを決定
/// 2. 環境に応じた.envファイルを読み込み
/// 3. 見つからない場合はデフォルトの.envにフォールバック
pub fn load_environment_variables() {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" => ".env.production",
        _ => ".env",
    };

    log::info!("環境: {environment}, 読み込み対象: {env_file}");

    match dotenv::from_filename(env_file) {
        Ok(_) => {
            log::info!("{env_file}ファイルを読み込みました");
        }
        Err(_) => {
            if env_file != ".env" {
                match dotenv::dotenv() {
                    Ok(_) => {
                        log::warn!("{env_file}が見つからないため、デフォルトの.envファイルを読み込みました");
                    }
                    Err(_) => {
                        log::warn!("環境変数ファイルが見つかりません。直接設定された環境変数を使用します。");
                    }
                }
            } else {
                log::warn!(".envファイルが見つかりません。直接設定された環境変数を使用します。");
            }
        }
    }
}

/// ログレベル文字列をフィルタに変換する
fn parse_log_level(level: &str) -> log::LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

/// ログシステムを初期化する
///
/// # 処理内容
/// 1. 環境設定を取得
/// 2. ログレベルを設定
/// 3. env_loggerを初期化（二重初期化は無視する）
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();

    let initialized = env_logger::Builder::from_default_env()
        .filter_level(parse_log_level(&env_config.log_level))
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();

    if initialized.is_ok() {
        log::info!(
            "ログシステムを初期化しました: level={}, environment={}",
            env_config.log_level,
            env_config.environment
        );
    }
}
