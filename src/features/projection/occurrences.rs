use super::period::{Cadence, DateWindow};
use chrono::NaiveDate;

/// `from`から`to`までに発生しうる支払い回数の上限
///
/// 各ステップは最低`min_step_days`日進むため、この回数を超えることはない。
fn step_bound(from: NaiveDate, to: NaiveDate, cadence: Cadence) -> i64 {
    if to < from {
        return 0;
    }
    (to - from).num_days() / cadence.min_step_days() + 1
}

/// 基準日から周期を繰り返し、`target`以降で最初の支払い日を求める
///
/// 日・週単位は日数が固定なので直接計算する。
/// 月・年単位は月末の切り詰めが累積するため、基準日から1回ずつ進める。
fn catch_up(cadence: Cadence, anchor: NaiveDate, target: NaiveDate) -> Option<NaiveDate> {
    if anchor >= target {
        return Some(anchor);
    }

    if let Some(step_days) = cadence.fixed_step_days() {
        let gap = (target - anchor).num_days();
        let steps = (gap + step_days - 1) / step_days;
        return anchor.checked_add_signed(chrono::Duration::days(steps * step_days));
    }

    let mut current = anchor;
    for _ in 0..step_bound(anchor, target, cadence) {
        if current >= target {
            return Some(current);
        }
        current = cadence.step(current)?;
    }
    (current >= target).then_some(current)
}

/// 期間内の全ての支払い日を列挙する
///
/// # 引数
/// * `cadence` - 支払い周期
/// * `anchor` - 次回支払い日（周期の起点）
/// * `end_date` - 契約終了日（この日を含む）
/// * `window` - 対象期間（両端を含む）
///
/// # 戻り値
/// 昇順の支払い日リスト
///
/// 基準日より前の日付は含まない。反復回数は期間の日数と周期の最小日数から
/// 決まる上限で打ち切られ、上限に達する前に期間の終わりに到達する。
pub fn occurrences_in_window(
    cadence: Cadence,
    anchor: NaiveDate,
    end_date: Option<NaiveDate>,
    window: DateWindow,
) -> Vec<NaiveDate> {
    if window.is_empty() || anchor > window.end {
        return Vec::new();
    }

    let last = match end_date {
        Some(end) if end < window.start => return Vec::new(),
        Some(end) => end.min(window.end),
        None => window.end,
    };

    let Some(mut current) = catch_up(cadence, anchor, window.start) else {
        return Vec::new();
    };

    let mut occurrences = Vec::new();
    for _ in 0..step_bound(current, last, cadence) {
        if current > last {
            break;
        }
        occurrences.push(current);
        match cadence.step(current) {
            Some(next) => current = next,
            None => break,
        }
    }

    occurrences
}

/// 指定日以降で最初の支払い日
///
/// 契約終了日を過ぎる場合はNone
pub fn first_occurrence_on_or_after(
    cadence: Cadence,
    anchor: NaiveDate,
    end_date: Option<NaiveDate>,
    date: NaiveDate,
) -> Option<NaiveDate> {
    catch_up(cadence, anchor, date).filter(|first| end_date.map_or(true, |end| *first <= end))
}
