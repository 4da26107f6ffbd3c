//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    Binding, ConnectionId, Participant, PlaybackState, RepositoryError, RoomCode, RoomState,
    UserId,
};

/// 参加（upsert）直後のスナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSnapshot {
    /// 参加後の Room（同じロックの中で取得したもの）
    pub room: RoomState,
    /// 同じ user_id の既存エントリを置き換えた場合、その旧エントリ
    pub replaced: Option<Participant>,
}

/// 退出直後のスナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub participant: Participant,
    /// 退出後に残っている参加者
    pub remaining: Vec<Participant>,
}

/// Room Registry
///
/// room code → Room のインメモリ管理。UseCase 層はこの trait に依存し、
/// Infrastructure 層の具体的な実装には依存しない。
///
/// ブロードキャストに使うスナップショットは、変更と同じロックの中で取得すること。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 既存の Room を返す。なければ空の Room を作成して返す
    async fn get_or_create(&self, room_code: &RoomCode) -> RoomState;

    /// Room を取得
    async fn get_room(&self, room_code: &RoomCode) -> Option<RoomState>;

    /// メモリ上の全 Room を取得
    async fn list_rooms(&self) -> Vec<RoomState>;

    /// 参加者を追加、または同じ user_id のエントリを置き換える
    ///
    /// Room がなければ作成する。`host_id` が与えられた場合は Room のホストとして記録する。
    async fn upsert_participant(
        &self,
        room_code: &RoomCode,
        host_id: Option<UserId>,
        participant: Participant,
    ) -> JoinSnapshot;

    /// 参加者を削除
    ///
    /// `expected_connection` が与えられた場合、そのコネクションが現在の参加者を
    /// 運んでいるときだけ削除する。存在しなければ `None`（冪等）。
    async fn remove_participant(
        &self,
        room_code: &RoomCode,
        user_id: &UserId,
        expected_connection: Option<ConnectionId>,
    ) -> Option<Departure>;

    /// 参加者を取得
    async fn find_participant(&self, room_code: &RoomCode, user_id: &UserId)
    -> Option<Participant>;

    /// 参加者一覧のスナップショット
    async fn participants(&self, room_code: &RoomCode) -> Vec<Participant>;

    /// Room のホスト
    async fn host_id(&self, room_code: &RoomCode) -> Option<UserId>;

    /// 参加者がいなければ Room を削除する。削除した場合 `true`
    async fn remove_if_empty(&self, room_code: &RoomCode) -> bool;

    /// Room を無条件に削除し、削除直前の状態を返す
    async fn remove_room(&self, room_code: &RoomCode) -> Option<RoomState>;

    /// ホストの再生状態を記録
    async fn record_playback(
        &self,
        room_code: &RoomCode,
        state: PlaybackState,
    ) -> Result<(), RepositoryError>;

    /// 記録済みの再生状態
    async fn playback(&self, room_code: &RoomCode) -> Option<PlaybackState>;
}

/// コネクション → (room, user) の紐付けテーブル
#[async_trait]
pub trait BindingRepository: Send + Sync {
    /// 紐付けを記録し、以前の紐付けを返す
    async fn bind(&self, connection_id: ConnectionId, binding: Binding) -> Option<Binding>;

    /// 紐付けを取得
    async fn get(&self, connection_id: &ConnectionId) -> Option<Binding>;

    /// 紐付けが `binding` と一致する場合だけ解除する
    async fn unbind_if(&self, connection_id: &ConnectionId, binding: &Binding) -> bool;
}
