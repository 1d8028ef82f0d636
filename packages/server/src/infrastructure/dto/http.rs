//! HTTP API response DTOs.

use serde::Serialize;

use super::websocket::{TimerDto, UserEntryDto};

/// Live room summary for the room list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub name: String,
    pub user_count: usize,
    pub host: Option<String>,
    pub timer_running: bool,
    pub created_at: String,
}

/// Live room detail
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub name: String,
    pub host: Option<String>,
    pub cycles: u32,
    pub timer: TimerDto,
    pub users: Vec<UserEntryDto>,
    pub created_at: String,
}
