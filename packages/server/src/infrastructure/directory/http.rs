//! HTTP の Room directory
//!
//! Room と会員情報を永続化しているプラットフォーム本体の API を呼び出します。
//!
//! - `GET  {base_url}/rooms/{room_code}` → `{"active": bool, "hostId": string}`（未知なら 404）
//! - `POST {base_url}/rooms/{room_code}/removals` ← `{"userId": string}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::{DirectoryError, MembershipStore, RoomCode, RoomInfo, RoomLookup, UserId};

const REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomLookupResponse {
    active: bool,
    host_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemovalRequest<'a> {
    user_id: &'a str,
}

pub struct HttpRoomDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRoomDirectory {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn room_url(&self, room_code: &RoomCode) -> String {
        format!("{}/rooms/{}", self.base_url, room_code)
    }
}

#[async_trait]
impl RoomLookup for HttpRoomDirectory {
    async fn lookup(&self, room_code: &RoomCode) -> Result<Option<RoomInfo>, DirectoryError> {
        let response = self
            .client
            .get(self.room_url(room_code))
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: RoomLookupResponse = response
                    .json()
                    .await
                    .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;
                let host_id = UserId::new(body.host_id)
                    .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;
                Ok(Some(RoomInfo {
                    active: body.active,
                    host_id,
                }))
            }
            status => Err(DirectoryError::Unavailable(format!(
                "room lookup returned {status}"
            ))),
        }
    }
}

#[async_trait]
impl MembershipStore for HttpRoomDirectory {
    async fn record_removal(
        &self,
        room_code: &RoomCode,
        user_id: &UserId,
    ) -> Result<(), DirectoryError> {
        let response = self
            .client
            .post(format!("{}/removals", self.room_url(room_code)))
            .json(&RemovalRequest {
                user_id: user_id.as_str(),
            })
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DirectoryError::Unavailable(format!(
                "removal endpoint returned {}",
                response.status()
            )))
        }
    }
}
