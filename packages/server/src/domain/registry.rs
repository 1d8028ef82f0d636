//! Room Registry
//!
//! プロセス全体で共有される「Room 名 → RoomState」のマップ。
//! メンバーシップ・Host・タイマーのメモリ上の唯一の持ち主です。
//!
//! ## 直列化
//!
//! Room ごとにゲート（非同期 Mutex）を持ちます。Room に触れる UseCase は処理の最初に
//! `lock_room` でゲートを取得し、永続ストアの await を含む処理全体をその Room について
//! 直列化します。異なる Room の処理は並行に進みます。
//! 1 つの処理が同時に保持するゲートは 1 つだけです。
//!
//! ゲートは最後の保持者が手放した時点でマップから取り除かれるため、
//! 存在しない Room 名を指定されてもマップは増え続けません。

use std::{
    collections::HashMap,
    sync::{
        Arc, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{RoomName, RoomState, Timestamp};

/// Room 名ごとのゲート。await を跨いで保持しないので同期 Mutex で守る
type GateMap = std::sync::Mutex<HashMap<RoomName, Arc<Mutex<()>>>>;

fn lock_gates(gates: &GateMap) -> MutexGuard<'_, HashMap<RoomName, Arc<Mutex<()>>>> {
    gates.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Room のゲートを保持している間は、その Room に対する他の処理は待たされる
///
/// drop 時に他の保持者・待機者がいなければ、マップからゲートを取り除く。
pub struct RoomGate {
    guard: Option<OwnedMutexGuard<()>>,
    room: RoomName,
    gates: Arc<GateMap>,
}

impl Drop for RoomGate {
    fn drop(&mut self) {
        drop(self.guard.take());

        // マップ内の参照だけが残っていれば、誰も待っていない
        let mut gates = lock_gates(&self.gates);
        if gates
            .get(&self.room)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            gates.remove(&self.room);
        }
    }
}

pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomName, RoomState>>,
    gates: Arc<GateMap>,
    next_generation: AtomicU64,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            gates: Arc::new(std::sync::Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Room のゲートを取得する
    pub async fn lock_room(&self, room: &RoomName) -> RoomGate {
        let gate = lock_gates(&self.gates)
            .entry(room.clone())
            .or_default()
            .clone();
        RoomGate {
            guard: Some(gate.lock_owned().await),
            room: room.clone(),
            gates: self.gates.clone(),
        }
    }

    /// 現在マップに残っているゲートの数
    pub fn gate_count(&self) -> usize {
        lock_gates(&self.gates).len()
    }

    pub async fn contains(&self, room: &RoomName) -> bool {
        self.rooms.lock().await.contains_key(room)
    }

    pub async fn snapshot(&self, room: &RoomName) -> Option<RoomState> {
        self.rooms.lock().await.get(room).cloned()
    }

    /// 全 Room のスナップショット（名前順）
    pub async fn snapshots(&self) -> Vec<RoomState> {
        let rooms = self.rooms.lock().await;
        let mut states: Vec<RoomState> = rooms.values().cloned().collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        states
    }

    pub async fn room_names(&self) -> Vec<RoomName> {
        let rooms = self.rooms.lock().await;
        let mut names: Vec<RoomName> = rooms.keys().cloned().collect();
        names.sort();
        names
    }

    /// Room が存在する場合だけ更新する
    pub async fn update<R>(
        &self,
        room: &RoomName,
        f: impl FnOnce(&mut RoomState) -> R,
    ) -> Option<R> {
        let mut rooms = self.rooms.lock().await;
        rooms.get_mut(room).map(f)
    }

    /// Room が無ければ作成してから更新する
    ///
    /// クロージャの第 2 引数は、この呼び出しで Room を作成したかどうか。
    pub async fn get_or_create<R>(
        &self,
        room: &RoomName,
        now: Timestamp,
        f: impl FnOnce(&mut RoomState, bool) -> R,
    ) -> R {
        let mut rooms = self.rooms.lock().await;
        let created = !rooms.contains_key(room);
        let state = rooms.entry(room.clone()).or_insert_with(|| {
            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
            tracing::info!("Room '{}' initialized (generation {})", room, generation);
            RoomState::new(room.clone(), generation, now)
        });
        f(state, created)
    }

    /// Room を削除する。タイマーハンドルはキャンセルされる
    pub async fn remove(&self, room: &RoomName) -> Option<RoomState> {
        let mut rooms = self.rooms.lock().await;
        let mut state = rooms.remove(room)?;
        state.cancel_timer_handle();
        state.users.clear();
        tracing::info!("Room '{}' removed from registry", room);
        Some(state)
    }

    /// 全 Room を破棄する（プロセス終了時）。破棄した Room 数を返す
    pub async fn shutdown(&self) -> usize {
        let mut rooms = self.rooms.lock().await;
        let count = rooms.len();
        for (_, mut state) in rooms.drain() {
            state.cancel_timer_handle();
        }
        lock_gates(&self.gates).clear();
        count
    }
}
