//! Value Object 定義
//!
//! 不変条件をコンストラクタで検証し、生成後は常に正しい値であることを保証します。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Room code の長さ（固定長）
pub const ROOM_CODE_LENGTH: usize = 8;

/// UserId / Username / DisplayName の最大文字数
pub const MAX_NAME_LENGTH: usize = 64;

/// ゲストユーザー ID のプレフィックス
pub const GUEST_ID_PREFIX: &str = "guest-";

/// 再生位置の上限（秒）。1 週間分。
pub const MAX_POSITION_SECS: f64 = 86_400.0 * 7.0;

/// チャット本文の最大文字数
pub const MAX_CHAT_LENGTH: usize = 2000;

/// Room code
///
/// 8 文字の英数字。大文字小文字を区別しないため、生成時に大文字へ正規化する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.chars().count() != ROOM_CODE_LENGTH {
            return Err(ValueObjectError::InvalidRoomCode(value));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValueObjectError::InvalidRoomCode(value));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room code の生成
pub struct RoomCodeFactory;

impl RoomCodeFactory {
    const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// ランダムな Room code を生成する
    ///
    /// 紛らわしい文字（0/O, 1/I）を含まないアルファベットから UUID v4 の乱数で選ぶ。
    pub fn generate() -> RoomCode {
        let bytes = Uuid::new_v4().into_bytes();
        let code: String = bytes
            .iter()
            .take(ROOM_CODE_LENGTH)
            .map(|b| Self::ALPHABET[(*b as usize) % Self::ALPHABET.len()] as char)
            .collect();
        RoomCode(code)
    }
}

/// User ID
///
/// 認証済みユーザーの ID、またはクライアントが生成した `guest-` 付きのゲスト ID。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty()
            || value.chars().count() > MAX_NAME_LENGTH
            || value.chars().any(char::is_whitespace)
        {
            return Err(ValueObjectError::InvalidUserId(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// クライアント生成のゲスト ID かどうか
    pub fn is_guest(&self) -> bool {
        self.0.starts_with(GUEST_ID_PREFIX)
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 表示用の名前（username / display name 共通）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Name(String);

impl Name {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(ValueObjectError::InvalidName(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Name {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// チャット本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatText(String);

impl ChatText {
    /// 前後の空白を除去して検証する
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyChatText);
        }
        let len = trimmed.chars().count();
        if len > MAX_CHAT_LENGTH {
            return Err(ValueObjectError::ChatTextTooLong(len));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// 再生位置（秒）
///
/// 負数・NaN は 0 に、上限超過は `MAX_POSITION_SECS` に丸める。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct PlaybackPosition(f64);

impl PlaybackPosition {
    pub fn new(seconds: f64) -> Self {
        if !seconds.is_finite() {
            // +inf は上限、NaN と -inf は先頭
            return if seconds == f64::INFINITY {
                Self(MAX_POSITION_SECS)
            } else {
                Self(0.0)
            };
        }
        Self(seconds.clamp(0.0, MAX_POSITION_SECS))
    }

    pub fn zero() -> Self {
        Self(0.0)
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// 経過時間（ミリ秒）分だけ進めた位置
    pub fn advanced_by_millis(&self, elapsed_millis: i64) -> Self {
        if elapsed_millis <= 0 {
            return *self;
        }
        Self::new(self.0 + elapsed_millis as f64 / 1000.0)
    }
}

/// Unix timestamp（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 物理コネクション（WebSocket）の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
