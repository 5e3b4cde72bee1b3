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
use super::clair::user_id_of;
use crate::receiver::test_helpers::fixture_store;
use crate::test_receiver;
use crate::{MailHandler, SimulationPolicy};
use vsink_common::SimulationMode;
use vsink_store::{DeliveryStatus, MemoryStore, MessageStore, NewMessage};

fn success_handler(store: &std::sync::Arc<MemoryStore>) -> MailHandler {
    MailHandler::new(
        store.clone(),
        store.clone(),
        std::sync::Arc::new(SimulationPolicy::new(SimulationMode::Success)),
    )
}

#[tokio::test]
async fn empty_body_is_rejected_and_not_persisted() {
    let store = fixture_store();
    let mut handler = success_handler(&store);

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => store.clone(),
        [
            "HELO x\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<box@y>\r\n",
            "DATA\r\n",
            "Subject: only headers\r\n",
            "\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "550 Message rejected: Email must contain either text/plain or text/html content\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());

    assert!(store.messages().is_empty());
}

#[tokio::test]
async fn simulated_permanent_failure_is_persisted() {
    let store = fixture_store();
    let mut handler = MailHandler::new(
        store.clone(),
        store.clone(),
        std::sync::Arc::new(SimulationPolicy::new(SimulationMode::Failure)),
    );

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => store.clone(),
        [
            "HELO x\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<box@y>\r\n",
            "DATA\r\n",
            "Subject: doomed\r\n",
            "\r\n",
            "will fail anyway\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "550 Simulated failure\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());

    // the message is persisted anyway, only its status records the verdict.
    let messages = store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].status, DeliveryStatus::Permanent);
    assert_eq!(messages[0].failure_reason.as_deref(), Some("Simulated failure"));
    assert_eq!(messages[0].text_body, "will fail anyway");
}

#[tokio::test]
async fn dot_stuffing_round_trip() {
    let store = fixture_store();
    let mut handler = success_handler(&store);

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => store.clone(),
        [
            "HELO x\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<box@y>\r\n",
            "DATA\r\n",
            "Subject: dots\r\n",
            "\r\n",
            "line1\r\n",
            "..dotted\r\n",
            "...double\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "250 OK: Message queued\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());

    let messages = store.messages();
    assert_eq!(
        messages[0].raw_content,
        "Subject: dots\r\n\r\nline1\r\n.dotted\r\n..double\r\n"
    );
}

#[tokio::test]
async fn several_recipients_are_joined() {
    let store = fixture_store();
    let mut handler = success_handler(&store);

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => store.clone(),
        [
            "HELO x\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<jdoe@y>\r\n",
            "RCPT TO:<other@z>\r\n",
            "DATA\r\n",
            "Subject: both\r\n",
            "\r\n",
            "hello both\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "250 OK: Message queued\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());

    let messages = store.messages();
    assert_eq!(messages[0].to_addr, "jdoe@y, other@z");
    // the first matching mailbox owns the message
    assert_eq!(messages[0].user_id, user_id_of(&store, "john.doe").await);
}

#[tokio::test]
async fn no_mailbox_and_no_root_rejects() {
    // a directory without any account
    let store = std::sync::Arc::new(MemoryStore::new());
    let mut handler = success_handler(&store);

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => store.clone(),
        [
            "HELO x\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<box@y>\r\n",
            "DATA\r\n",
            "Subject: homeless\r\n",
            "\r\n",
            "body\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "550 No valid mailbox found\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());

    assert!(store.messages().is_empty());
}

#[tokio::test]
async fn multipart_message_with_attachment() {
    let store = fixture_store();
    let mut handler = success_handler(&store);

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => store.clone(),
        [
            "HELO x\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<jdoe@y>\r\n",
            "DATA\r\n",
            "Subject: report\r\n",
            "Content-Type: multipart/mixed; boundary=bnd\r\n",
            "\r\n",
            "--bnd\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "see attached\r\n",
            "--bnd\r\n",
            "Content-Type: application/pdf\r\n",
            "Content-Disposition: attachment; filename=\"report.pdf\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "JVBERi0=\r\n",
            "--bnd--\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "250 OK: Message queued\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());

    let messages = store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text_body, "see attached");

    let attachments = store.attachments_of(messages[0].id);
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].filename, "report.pdf");
    assert_eq!(attachments[0].content_type, "application/pdf");
    assert_eq!(attachments[0].data, b"%PDF-");
    assert_eq!(attachments[0].size, 5);
}

#[tokio::test]
async fn inline_image_is_not_persisted() {
    let store = fixture_store();
    let mut handler = success_handler(&store);

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => store.clone(),
        [
            "HELO x\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<jdoe@y>\r\n",
            "DATA\r\n",
            "Subject: with inline\r\n",
            "Content-Type: multipart/mixed; boundary=bnd\r\n",
            "\r\n",
            "--bnd\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "the text\r\n",
            "--bnd\r\n",
            "Content-Type: image/png\r\n",
            "Content-Disposition: inline\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "iVBORw0KGgo=\r\n",
            "--bnd--\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "250 OK: Message queued\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());

    let messages = store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text_body, "the text");
    assert_eq!(messages[0].status, DeliveryStatus::Success);
    assert!(store.attachments_of(messages[0].id).is_empty());
}

/// a backend that refuses everything.
struct BrokenStore;

#[async_trait::async_trait]
impl MessageStore for BrokenStore {
    async fn create_message(&self, _: NewMessage) -> anyhow::Result<vsink_store::Message> {
        anyhow::bail!("backend unavailable")
    }

    async fn add_attachment(
        &self,
        _: uuid::Uuid,
        _: &str,
        _: &str,
        _: Vec<u8>,
    ) -> anyhow::Result<vsink_store::Attachment> {
        anyhow::bail!("backend unavailable")
    }

    async fn update_message_status(
        &self,
        _: uuid::Uuid,
        _: DeliveryStatus,
        _: Option<&str>,
    ) -> anyhow::Result<()> {
        anyhow::bail!("backend unavailable")
    }
}

#[tokio::test]
async fn storage_failure_keeps_the_session_alive() {
    let users = fixture_store();
    let mut handler = MailHandler::new(
        std::sync::Arc::new(BrokenStore),
        users.clone(),
        std::sync::Arc::new(SimulationPolicy::new(SimulationMode::Success)),
    );

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => users,
        [
            "HELO x\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<jdoe@y>\r\n",
            "DATA\r\n",
            "Subject: lost\r\n",
            "\r\n",
            "body\r\n",
            ".\r\n",
            "NOOP\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "550 Failed to store message\r\n",
            "250 OK\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());
}
