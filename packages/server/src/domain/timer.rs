//! 共有カウントダウンタイマーの状態遷移
//!
//! サーバーは時計を持たず、クライアントから届いた値を検証して中継するだけ。
//! 状態は `Idle/Paused`（`running == false`）と `Running` の 2 つ。

use super::entity::TimerState;

/// タイマーの初期秒数（25 分）
pub const DEFAULT_TIMER_SECONDS: u32 = 25 * 60;

/// タイマーの初期ラベル
pub const DEFAULT_TIMER_LABEL: &str = "Custom Timer";

impl Default for TimerState {
    fn default() -> Self {
        Self {
            running: false,
            seconds: DEFAULT_TIMER_SECONDS,
            label: DEFAULT_TIMER_LABEL.to_string(),
        }
    }
}

/// `tick` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// タイマーが動いていないため無視した
    Ignored,
    /// 秒数を更新した
    Updated,
    /// 秒数が 0 以下に達し、停止した（更新の後に最終状態を送る）
    Finished,
}

impl TimerState {
    /// クライアントが報告した秒数を非負に丸める
    pub fn clamp_seconds(seconds: i64) -> u32 {
        seconds.clamp(0, i64::from(u32::MAX)) as u32
    }

    /// 指定されたタイマーで開始する
    pub fn start(&mut self, timer: TimerState) {
        *self = Self {
            running: true,
            ..timer
        };
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// 動作中の場合のみ秒数を更新する
    pub fn tick(&mut self, seconds: i64) -> TickOutcome {
        if !self.running {
            return TickOutcome::Ignored;
        }
        self.seconds = Self::clamp_seconds(seconds);
        if seconds <= 0 {
            self.running = false;
            TickOutcome::Finished
        } else {
            TickOutcome::Updated
        }
    }

    /// 指定されたタイマーに戻す。常に停止状態になる
    pub fn reset(&mut self, timer: TimerState) {
        *self = Self {
            running: false,
            ..timer
        };
    }
}
