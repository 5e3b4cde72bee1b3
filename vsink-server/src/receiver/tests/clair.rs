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
use crate::receiver::test_helpers::{fixture_store, local_test_config};
use crate::test_receiver;
use crate::{MailHandler, SimulationPolicy};
use vsink_common::SimulationMode;
use vsink_store::DeliveryStatus;

// see https://datatracker.ietf.org/doc/html/rfc5321#section-4.3.2

#[tokio::test]
async fn test_receiver_1() {
    let store = fixture_store();
    let mut handler = MailHandler::new(
        store.clone(),
        store.clone(),
        std::sync::Arc::new(SimulationPolicy::new(SimulationMode::Success)),
    );

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => store.clone(),
        [
            "HELO x\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<box@y>\r\n",
            "DATA\r\n",
            "Subject: Hi\r\n",
            "\r\n",
            "hello\r\n",
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

    let message = &messages[0];
    assert_eq!(message.from_addr, "a@x");
    assert_eq!(message.to_addr, "box@y");
    assert_eq!(message.subject, "Hi");
    assert_eq!(message.text_body, "hello");
    assert_eq!(message.html_body, "");
    assert_eq!(message.raw_content, "Subject: Hi\r\n\r\nhello\r\n");
    assert_eq!(message.headers, "Subject: Hi\r\n");
    assert_eq!(message.status, DeliveryStatus::Success);
    assert!(message.failure_reason.is_none());
    // no mailbox matches "box", the root account owns the message
    assert_eq!(message.user_id, user_id_of(&store, "admin").await);
    assert!(store.attachments_of(message.id).is_empty());
}

pub(super) async fn user_id_of(store: &vsink_store::MemoryStore, username: &str) -> uuid::Uuid {
    vsink_store::UserLookup::by_username(store, username)
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_receiver_2() {
    assert!(test_receiver! {
        ["foo\r\n"].concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "500 Command not recognized\r\n",
        ]
        .concat()
    }
    .is_ok());
}

#[tokio::test]
async fn test_receiver_3() {
    assert!(test_receiver! {
        ["MAIL FROM pleased to meet you\r\n"].concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "501 Syntax error in parameters\r\n",
        ]
        .concat()
    }
    .is_ok());
}

#[tokio::test]
async fn test_receiver_4() {
    assert!(test_receiver! {
        ["HELO foo\r\n", "RCPT TO:<box>\r\n"].concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "501 Syntax error in parameters\r\n",
        ]
        .concat()
    }
    .is_ok());
}

#[tokio::test]
async fn test_receiver_5() {
    assert!(test_receiver! {
        ["HELO foobar\r\n", "QUIT\r\n"].concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());
}

#[tokio::test]
async fn ehlo_advertises_auth() {
    assert!(test_receiver! {
        ["EHLO client.local\r\n", "QUIT\r\n"].concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250-Hello, pleased to meet you\r\n250 AUTH PLAIN LOGIN\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());
}

#[tokio::test]
async fn noop_and_rset_always_answer() {
    assert!(test_receiver! {
        ["NOOP\r\n", "RSET\r\n", "NOOP ignored\r\n", "QUIT\r\n"].concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());
}

// the dispatch is permissive: a transaction may start without HELO, the
// envelope is what gets validated.
#[tokio::test]
async fn mail_before_helo_is_accepted() {
    assert!(test_receiver! {
        ["MAIL FROM:<a@x>\r\n", "QUIT\r\n"].concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 OK\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());
}

#[tokio::test]
async fn eof_without_quit_is_clean() {
    assert!(test_receiver! {
        ["HELO x\r\n"].concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
        ]
        .concat()
    }
    .is_ok());
}

#[tokio::test]
async fn recipients_above_the_cap_are_refused() {
    let mut config = local_test_config();
    config.server.smtp.rcpt_count_max = 1;

    let store = fixture_store();
    let mut handler = MailHandler::new(
        store.clone(),
        store.clone(),
        std::sync::Arc::new(SimulationPolicy::new(SimulationMode::Success)),
    );

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => store.clone(),
        with_config => config,
        [
            "HELO x\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<jdoe@y>\r\n",
            "RCPT TO:<other@z>\r\n",
            "DATA\r\n",
            "Subject: capped\r\n",
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
            "452 Requested action not taken: too many recipients\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "250 OK: Message queued\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());

    // the refused recipient was not added to the envelope
    let messages = store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].to_addr, "jdoe@y");
}

#[tokio::test]
async fn hard_error_count_drops_the_session() {
    let mut config = local_test_config();
    config.server.smtp.error.soft_count = -1;
    config.server.smtp.error.hard_count = 2;

    let store = fixture_store();
    let mut handler = MailHandler::new(
        store.clone(),
        store.clone(),
        std::sync::Arc::new(SimulationPolicy::new(SimulationMode::Success)),
    );

    assert!(test_receiver! {
        on_mail => &mut handler,
        with_users => store,
        with_config => config,
        ["foo\r\n", "bar\r\n", "HELO x\r\n"].concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "500 Command not recognized\r\n",
            "500-Command not recognized\r\n451 Too many errors from the client\r\n",
        ]
        .concat()
    }
    .is_err());
}
