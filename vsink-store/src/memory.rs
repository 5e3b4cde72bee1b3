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
use crate::model::{Attachment, DeliveryStatus, Message, User, UserRole};
use crate::{MessageStore, NewMessage, UserLookup};

/// In-memory implementation of the storage contracts.
///
/// Development and test backend. Passwords are compared in clear, hashing
/// belongs to the management surface in front of a production directory.
#[derive(Default)]
pub struct MemoryStore {
    messages: std::sync::RwLock<Vec<Message>>,
    attachments: std::sync::RwLock<Vec<Attachment>>,
    users: std::sync::RwLock<Vec<User>>,
}

impl MemoryStore {
    ///
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a root account, mailbox `root`.
    #[must_use]
    pub fn with_root(username: &str, password: &str, email: &str) -> Self {
        let store = Self::default();
        store.add_user(User {
            id: uuid::Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password.to_string(),
            email: email.to_string(),
            role: UserRole::Root,
            mailbox_name: "root".to_string(),
            active: true,
        });
        store
    }

    /// Register an account.
    pub fn add_user(&self, user: User) {
        self.users.write().expect("user lock poisoned").push(user);
    }

    /// Snapshot of every message, newest last. Used by the inspection
    /// surface and the tests.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages.read().expect("message lock poisoned").clone()
    }

    /// Snapshot of the attachments of one message, in insertion order.
    #[must_use]
    pub fn attachments_of(&self, message_id: uuid::Uuid) -> Vec<Attachment> {
        self.attachments
            .read()
            .expect("attachment lock poisoned")
            .iter()
            .filter(|a| a.message_id == message_id)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(&self, message: NewMessage) -> anyhow::Result<Message> {
        let now = time::OffsetDateTime::now_utc();
        let message = Message {
            id: uuid::Uuid::new_v4(),
            user_id: message.user_id,
            from_addr: message.from,
            to_addr: message.to,
            cc: message.cc,
            bcc: message.bcc,
            subject: message.subject,
            text_body: message.text_body,
            html_body: message.html_body,
            raw_content: message.raw_content,
            headers: message.headers,
            status: DeliveryStatus::Success,
            failure_reason: None,
            received_at: now,
            created_at: now,
            updated_at: now,
        };

        self.messages
            .write()
            .expect("message lock poisoned")
            .push(message.clone());

        log::debug!("message '{}' stored for user '{}'", message.id, message.user_id);
        Ok(message)
    }

    async fn add_attachment(
        &self,
        message_id: uuid::Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> anyhow::Result<Attachment> {
        if !self
            .messages
            .read()
            .expect("message lock poisoned")
            .iter()
            .any(|m| m.id == message_id)
        {
            anyhow::bail!("message not found: '{}'", message_id)
        }

        let attachment = Attachment {
            id: uuid::Uuid::new_v4(),
            message_id,
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            size: data.len() as u64,
            data,
            created_at: time::OffsetDateTime::now_utc(),
        };

        self.attachments
            .write()
            .expect("attachment lock poisoned")
            .push(attachment.clone());

        Ok(attachment)
    }

    async fn update_message_status(
        &self,
        id: uuid::Uuid,
        status: DeliveryStatus,
        failure_reason: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut messages = self.messages.write().expect("message lock poisoned");
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| anyhow::anyhow!("message not found: '{}'", id))?;

        message.status = status;
        message.failure_reason = failure_reason.map(str::to_string);
        message.updated_at = time::OffsetDateTime::now_utc();
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserLookup for MemoryStore {
    async fn by_username(&self, username: &str) -> anyhow::Result<User> {
        self.users
            .read()
            .expect("user lock poisoned")
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("user not found: '{}'", username))
    }

    async fn by_mailbox(&self, mailbox: &str) -> anyhow::Result<User> {
        self.users
            .read()
            .expect("user lock poisoned")
            .iter()
            .find(|u| u.mailbox_name == mailbox)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("mailbox not found: '{}'", mailbox))
    }

    async fn authenticate(&self, username: &str, password: &str) -> anyhow::Result<User> {
        let user = self.by_username(username).await?;
        if !user.active {
            anyhow::bail!("user account is disabled: '{}'", username)
        }
        if user.password_hash != password {
            anyhow::bail!("invalid credentials for: '{}'", username)
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_message(user_id: uuid::Uuid) -> NewMessage {
        NewMessage {
            user_id,
            from: "a@example.com".to_string(),
            to: "root@sink.local".to_string(),
            cc: String::new(),
            bcc: String::new(),
            subject: "hi".to_string(),
            text_body: "hello".to_string(),
            html_body: String::new(),
            raw_content: "Subject: hi\r\n\r\nhello\r\n".to_string(),
            headers: "Subject: hi\r\n".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_update_status() {
        let store = MemoryStore::with_root("admin", "admin123", "admin@sink.local");
        let root = store.by_username("admin").await.unwrap();

        let message = store.create_message(new_message(root.id)).await.unwrap();
        assert_eq!(message.status, DeliveryStatus::Success);
        assert!(message.failure_reason.is_none());

        store
            .update_message_status(message.id, DeliveryStatus::Permanent, Some("Simulated failure"))
            .await
            .unwrap();

        let stored = &store.messages()[0];
        assert_eq!(stored.status, DeliveryStatus::Permanent);
        assert_eq!(stored.failure_reason.as_deref(), Some("Simulated failure"));
    }

    #[tokio::test]
    async fn attachment_size_matches_data() {
        let store = MemoryStore::with_root("admin", "admin123", "admin@sink.local");
        let root = store.by_username("admin").await.unwrap();
        let message = store.create_message(new_message(root.id)).await.unwrap();

        let attachment = store
            .add_attachment(message.id, "report.pdf", "application/pdf", b"%PDF-".to_vec())
            .await
            .unwrap();

        assert_eq!(attachment.size, 5);
        assert_eq!(store.attachments_of(message.id).len(), 1);

        // unknown message id is refused
        assert!(store
            .add_attachment(uuid::Uuid::new_v4(), "x", "text/plain", vec![1])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn authenticate_checks_active_flag() {
        let store = MemoryStore::with_root("admin", "admin123", "admin@sink.local");
        store.add_user(User {
            id: uuid::Uuid::new_v4(),
            username: "gone".to_string(),
            password_hash: "pw".to_string(),
            email: "gone@sink.local".to_string(),
            role: UserRole::User,
            mailbox_name: "gone".to_string(),
            active: false,
        });

        assert!(store.authenticate("admin", "admin123").await.is_ok());
        assert!(store.authenticate("admin", "wrong").await.is_err());
        assert!(store.authenticate("gone", "pw").await.is_err());
        assert!(store.authenticate("nobody", "pw").await.is_err());
    }

    #[tokio::test]
    async fn mailbox_lookup() {
        let store = MemoryStore::with_root("admin", "admin123", "admin@sink.local");
        assert_eq!(store.by_mailbox("root").await.unwrap().username, "admin");
        assert!(store.by_mailbox("unknown").await.is_err());
    }
}
