//! vSink storage contracts
//!
//! The SMTP core never talks to a database directly: it consumes the
//! [`MessageStore`] and [`UserLookup`] traits defined here. The crate also
//! ships [`MemoryStore`], the development implementation backing the test
//! suite and the default standalone binary.

#![doc(html_no_source)]
#![deny(missing_docs)]
//
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
//
#![allow(clippy::doc_markdown)]

mod memory;
mod model;

pub use memory::MemoryStore;
pub use model::{Attachment, DeliveryStatus, Message, User, UserRole};

/// Everything needed to persist one captured message.
///
/// Ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// owner of the mailbox the message landed in.
    pub user_id: uuid::Uuid,
    /// envelope sender.
    pub from: String,
    /// envelope recipients, comma-joined.
    pub to: String,
    /// Cc header value, verbatim.
    pub cc: String,
    /// Bcc header value, verbatim.
    pub bcc: String,
    /// Subject header value, verbatim.
    pub subject: String,
    /// decoded text/plain body, trimmed.
    pub text_body: String,
    /// decoded text/html body, trimmed.
    pub html_body: String,
    /// the full DATA blob as received (post dot-stuffing removal).
    pub raw_content: String,
    /// reassembled canonical header block.
    pub headers: String,
}

/// Persistence operations consumed by the SMTP core.
///
/// Implementations are shared across sessions and must be safe for
/// concurrent use. The three operations commit independently, no
/// transactional grouping is required.
#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message with status [`DeliveryStatus::Success`].
    ///
    /// # Errors
    ///
    /// * the backend refused the row
    async fn create_message(&self, message: NewMessage) -> anyhow::Result<Message>;

    /// Attach a file to an already persisted message.
    ///
    /// # Errors
    ///
    /// * the message does not exist
    /// * the backend refused the row
    async fn add_attachment(
        &self,
        message_id: uuid::Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> anyhow::Result<Attachment>;

    /// Record the simulation verdict of a message right after its creation.
    ///
    /// # Errors
    ///
    /// * the message does not exist
    async fn update_message_status(
        &self,
        id: uuid::Uuid,
        status: DeliveryStatus,
        failure_reason: Option<&str>,
    ) -> anyhow::Result<()>;
}

/// User directory consumed by the SMTP core, read-only.
#[async_trait::async_trait]
pub trait UserLookup: Send + Sync {
    /// Find a user by its login name.
    ///
    /// # Errors
    ///
    /// * no user carries this username
    async fn by_username(&self, username: &str) -> anyhow::Result<User>;

    /// Find a user by its mailbox name (the local-part of a recipient
    /// address).
    ///
    /// # Errors
    ///
    /// * no user carries this mailbox
    async fn by_mailbox(&self, mailbox: &str) -> anyhow::Result<User>;

    /// Verify a username/password pair.
    ///
    /// # Errors
    ///
    /// * unknown username, disabled account or wrong password
    async fn authenticate(&self, username: &str, password: &str) -> anyhow::Result<User>;
}
