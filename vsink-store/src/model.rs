/*
 * vSink mail capture server
 * Copyright (C) 2022 the vSink authors
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/

/// Delivery status of a captured message, as observed by the client.
#[derive(Debug, Copy, Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// accepted with `250 OK: Message queued`.
    Success,
    /// the storage refused the message after acceptance.
    Failed,
    /// rejected by an explicit simulation rule.
    Simulated,
    /// rejected with a transient (4xx-like) simulated failure.
    Temporary,
    /// rejected with a permanent simulated failure.
    Permanent,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DeliveryStatus::Success => "success",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Simulated => "simulated",
            DeliveryStatus::Temporary => "temporary",
            DeliveryStatus::Permanent => "permanent",
        })
    }
}

/// Role of an account, only read by the SMTP core.
#[derive(Debug, Copy, Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// the fallback account owning messages without a matching mailbox.
    Root,
    /// a regular mailbox owner.
    User,
}

/// An account able to authenticate and to own captured messages.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct User {
    ///
    pub id: uuid::Uuid,
    /// login name for AUTH.
    pub username: String,
    /// opaque to the core, verification goes through
    /// [`crate::UserLookup::authenticate`].
    #[serde(skip_serializing)]
    pub password_hash: String,
    ///
    pub email: String,
    ///
    pub role: UserRole,
    /// local-part of recipient addresses routed to this account.
    pub mailbox_name: String,
    /// disabled accounts cannot authenticate.
    pub active: bool,
}

impl User {
    ///
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.role == UserRole::Root
    }
}

/// One captured message.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Message {
    ///
    pub id: uuid::Uuid,
    /// owner of the mailbox.
    pub user_id: uuid::Uuid,
    /// envelope sender.
    #[serde(rename = "from")]
    pub from_addr: String,
    /// envelope recipients, comma-joined.
    #[serde(rename = "to")]
    pub to_addr: String,
    ///
    pub cc: String,
    ///
    pub bcc: String,
    ///
    pub subject: String,
    ///
    pub text_body: String,
    ///
    pub html_body: String,
    /// the full DATA blob as received.
    pub raw_content: String,
    /// reassembled canonical header block.
    pub headers: String,
    ///
    pub status: DeliveryStatus,
    /// set when status is a failure.
    pub failure_reason: Option<String>,
    ///
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: time::OffsetDateTime,
    ///
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
    ///
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: time::OffsetDateTime,
}

/// A file extracted from a captured message, owned by its [`Message`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct Attachment {
    ///
    pub id: uuid::Uuid,
    /// back-reference to the owning message.
    pub message_id: uuid::Uuid,
    ///
    pub filename: String,
    ///
    pub content_type: String,
    /// always equals `data.len()`.
    pub size: u64,
    /// decoded content.
    #[serde(skip_serializing)]
    pub data: Vec<u8>,
    ///
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}
