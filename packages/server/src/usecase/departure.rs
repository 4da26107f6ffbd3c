//! 退出後の共通処理
//!
//! leave / disconnect / kick / 別 Room への join で共有します。

use crate::domain::{
    ConnectionId, Departure, MessagePusher, RoomCode, RoomEvent, RoomRepository, UserId,
};

/// 参加者を Room から外し、残りの参加者に通知する
///
/// `expected_connection` を指定した場合、そのコネクションが現在の参加者を
/// 運んでいるときだけ削除する。削除した場合は `Departure` を返す。
pub(crate) async fn remove_and_announce(
    repository: &dyn RoomRepository,
    message_pusher: &dyn MessagePusher,
    room_code: &RoomCode,
    user_id: &UserId,
    expected_connection: Option<ConnectionId>,
) -> Option<Departure> {
    let departure = repository
        .remove_participant(room_code, user_id, expected_connection)
        .await?;
    tracing::info!(
        "Participant '{}' left room '{}' ({} remaining)",
        user_id,
        room_code,
        departure.remaining.len()
    );
    announce_departure(repository, message_pusher, room_code, &departure).await;
    Some(departure)
}

/// 退出を残りの参加者に通知する。誰も残っていなければ Room を削除する
pub(crate) async fn announce_departure(
    repository: &dyn RoomRepository,
    message_pusher: &dyn MessagePusher,
    room_code: &RoomCode,
    departure: &Departure,
) {
    if departure.remaining.is_empty() {
        repository.remove_if_empty(room_code).await;
        return;
    }

    let targets: Vec<_> = departure
        .remaining
        .iter()
        .map(|p| p.connection_id)
        .collect();
    let events = [
        RoomEvent::user_left(&departure.participant),
        RoomEvent::ParticipantList(departure.remaining.clone()),
    ];
    for event in &events {
        if let Err(e) = message_pusher.broadcast(targets.clone(), event).await {
            tracing::warn!(
                "Failed to broadcast '{}' in room '{}': {}",
                event.name(),
                room_code,
                e
            );
        }
    }
}
