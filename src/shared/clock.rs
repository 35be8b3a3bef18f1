use chrono::{DateTime, Utc};

/// 現在時刻の取得元
///
/// 集計は現在時刻を一度だけ読み取り、その値で全ての数値を計算する。
/// テストでは`FixedClock`を渡して時刻を固定する。
pub trait Clock: Send + Sync {
    /// 現在時刻（UTC）
    fn now(&self) -> DateTime<Utc>;
}

/// システム時計
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時刻を返す時計
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
