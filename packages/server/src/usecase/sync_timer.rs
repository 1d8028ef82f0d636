//! UseCase: 共有タイマーの同期
//!
//! サーバーは時間を進めず、クライアントからの操作を検証して Room に中継する。
//! Registry が把握していない Room への操作は何もしない（タイマー操作で Room は作られない）。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, OutboundEvent, RoomName, RoomRegistry, RoomState, TickOutcome,
    TimerState,
};

use super::notify;

pub struct SyncTimerUseCase {
    registry: Arc<RoomRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SyncTimerUseCase {
    pub fn new(registry: Arc<RoomRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// タイマーを開始する
    pub async fn start(&self, room: &RoomName, timer: TimerState) -> bool {
        self.apply(room, "start", |state| {
            state.cancel_timer_handle();
            state.timer.start(timer);
            vec![state.timer.clone()]
        })
        .await
    }

    pub async fn pause(&self, room: &RoomName) -> bool {
        self.apply(room, "pause", |state| {
            state.timer.pause();
            state.cancel_timer_handle();
            vec![state.timer.clone()]
        })
        .await
    }

    /// クライアントが報告した残り秒数を反映する
    ///
    /// 0 以下に達した場合は停止した最終状態をもう 1 度送る。
    pub async fn tick(&self, room: &RoomName, seconds: i64) -> bool {
        self.apply(room, "tick", |state| match state.timer.tick(seconds) {
            TickOutcome::Ignored => Vec::new(),
            TickOutcome::Updated => vec![state.timer.clone()],
            TickOutcome::Finished => {
                tracing::info!("Timer finished in room '{}'", state.name);
                let running = TimerState {
                    running: true,
                    ..state.timer.clone()
                };
                vec![running, state.timer.clone()]
            }
        })
        .await
    }

    pub async fn reset(&self, room: &RoomName, timer: TimerState) -> bool {
        self.apply(room, "reset", |state| {
            state.timer.reset(timer);
            state.cancel_timer_handle();
            vec![state.timer.clone()]
        })
        .await
    }

    /// 現在のタイマーを呼び出し元に送る。Room が無い場合は既定値
    pub async fn request_state(&self, connection_id: &ConnectionId, room: &RoomName) {
        let timer = self
            .registry
            .snapshot(room)
            .await
            .map(|state| state.timer)
            .unwrap_or_else(|| {
                tracing::debug!("No timer state for room '{}', sending default", room);
                TimerState::default()
            });
        notify::to_caller(
            self.message_pusher.as_ref(),
            connection_id,
            OutboundEvent::TimerUpdate(timer),
        )
        .await;
    }

    /// 操作を適用し、返された状態を順に Room へ送る。Room が無い場合は false
    async fn apply(
        &self,
        room: &RoomName,
        action: &str,
        f: impl FnOnce(&mut RoomState) -> Vec<TimerState>,
    ) -> bool {
        let _gate = self.registry.lock_room(room).await;
        let Some(updates) = self.registry.update(room, f).await else {
            tracing::debug!("timer:{} ignored: room '{}' is not tracked", action, room);
            return false;
        };
        if updates.is_empty() {
            tracing::debug!("timer:{} ignored: timer in room '{}' is not running", action, room);
        }
        for timer in updates {
            notify::to_room(
                self.message_pusher.as_ref(),
                room,
                OutboundEvent::TimerUpdate(timer),
            )
            .await;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use crate::usecase::test_support::{Fixture, drain, member, room};

    fn focus_timer(seconds: u32) -> TimerState {
        TimerState {
            running: false,
            seconds,
            label: "Focus".to_string(),
        }
    }

    async fn setup() -> (
        Fixture,
        SyncTimerUseCase,
        tokio::sync::mpsc::UnboundedReceiver<String>,
    ) {
        let fixture = Fixture::new();
        let alice = member("c1", "alice", "Alice");
        let rx = fixture.connect(&alice).await;
        fixture
            .registry
            .get_or_create(&room("X"), Timestamp::new(0), |_, _| ())
            .await;
        fixture.pusher.subscribe(&room("X"), &alice.connection_id).await;
        let usecase = SyncTimerUseCase::new(fixture.registry.clone(), fixture.pusher.clone());
        (fixture, usecase, rx)
    }

    #[tokio::test]
    async fn test_start_then_final_tick() {
        // テスト項目: 開始後に 0 秒の tick が届くと、停止した最終状態がもう 1 度送られる
        // given (前提条件):
        let (_fixture, usecase, mut rx) = setup().await;

        // when (操作):
        usecase.start(&room("X"), focus_timer(600)).await;
        usecase.tick(&room("X"), 0).await;

        // then (期待する結果):
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames[0]["data"],
            serde_json::json!({"running": true, "seconds": 600, "label": "Focus"})
        );
        assert_eq!(frames[1]["data"]["seconds"], 0);
        assert_eq!(
            frames[2]["data"],
            serde_json::json!({"running": false, "seconds": 0, "label": "Focus"})
        );
    }

    #[tokio::test]
    async fn test_tick_ignored_when_not_running() {
        // テスト項目: 動いていないタイマーへの tick は無視される
        // given (前提条件):
        let (fixture, usecase, mut rx) = setup().await;

        // when (操作):
        usecase.tick(&room("X"), 42).await;

        // then (期待する結果):
        assert!(drain(&mut rx).is_empty());
        let state = fixture.registry.snapshot(&room("X")).await.unwrap();
        assert_eq!(state.timer, TimerState::default());
    }

    #[tokio::test]
    async fn test_reset_always_stops() {
        // テスト項目: reset は以前の状態に関わらず停止状態になる
        // given (前提条件):
        let (fixture, usecase, mut rx) = setup().await;
        usecase.start(&room("X"), focus_timer(600)).await;
        drain(&mut rx);

        // when (操作):
        let running = TimerState {
            running: true,
            ..focus_timer(300)
        };
        usecase.reset(&room("X"), running).await;

        // then (期待する結果):
        let frames = drain(&mut rx);
        assert_eq!(frames[0]["data"]["running"], false);
        assert_eq!(frames[0]["data"]["seconds"], 300);
        let state = fixture.registry.snapshot(&room("X")).await.unwrap();
        assert!(!state.timer.running);
    }

    #[tokio::test]
    async fn test_pause_stops_timer() {
        // テスト項目: pause で running が false になり、秒数は保持される
        // given (前提条件):
        let (_fixture, usecase, mut rx) = setup().await;
        usecase.start(&room("X"), focus_timer(600)).await;
        usecase.tick(&room("X"), 590).await;
        drain(&mut rx);

        // when (操作):
        usecase.pause(&room("X")).await;

        // then (期待する結果):
        let frames = drain(&mut rx);
        assert_eq!(
            frames[0]["data"],
            serde_json::json!({"running": false, "seconds": 590, "label": "Focus"})
        );
    }

    #[tokio::test]
    async fn test_operations_on_unknown_room_are_ignored() {
        // テスト項目: Registry に無い Room へのタイマー操作は Room を作らない
        // given (前提条件):
        let (fixture, usecase, mut rx) = setup().await;

        // when (操作):
        let started = usecase.start(&room("ghost"), focus_timer(60)).await;

        // then (期待する結果):
        assert!(!started);
        assert!(!fixture.registry.contains(&room("ghost")).await);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_request_state_defaults_for_unknown_room() {
        // テスト項目: 存在しない Room のタイマー要求には既定値が返される
        // given (前提条件):
        let (_fixture, usecase, mut rx) = setup().await;
        let alice = member("c1", "alice", "Alice");

        // when (操作):
        usecase.request_state(&alice.connection_id, &room("ghost")).await;

        // then (期待する結果):
        let frames = drain(&mut rx);
        assert_eq!(
            frames[0]["data"],
            serde_json::json!({"running": false, "seconds": 1500, "label": "Custom Timer"})
        );
    }
}
