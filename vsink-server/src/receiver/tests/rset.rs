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

#[tokio::test]
async fn rset_clears_the_envelope() {
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
            "RSET\r\n",
            "DATA\r\n",
            "Subject: t\r\n",
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
            "250 OK\r\n",
            "354 End data with <CR><LF>.<CR><LF>\r\n",
            "550 No valid sender or recipient\r\n",
            "221 Bye\r\n",
        ]
        .concat()
    }
    .is_ok());

    assert!(store.messages().is_empty());
}

#[tokio::test]
async fn rset_preserves_authentication() {
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
            "AUTH PLAIN AGpvaG4uZG9lAHNlY3JldA==\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RSET\r\n",
            "MAIL FROM:<b@x>\r\n",
            "RCPT TO:<box@y>\r\n",
            "DATA\r\n",
            "Subject: again\r\n",
            "\r\n",
            "second try\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            "220 testserver.com ESMTP vSink\r\n",
            "250 Hello, pleased to meet you\r\n",
            "235 Authentication successful\r\n",
            "250 OK\r\n",
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
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].from_addr, "b@x");
    assert_eq!(messages[0].user_id, user_id_of(&store, "john.doe").await);
}

#[tokio::test]
async fn a_session_can_carry_several_messages() {
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
            "RCPT TO:<jdoe@y>\r\n",
            "DATA\r\n",
            "Subject: one\r\n",
            "\r\n",
            "first\r\n",
            ".\r\n",
            "MAIL FROM:<a@x>\r\n",
            "RCPT TO:<jdoe@y>\r\n",
            "DATA\r\n",
            "Subject: two\r\n",
            "\r\n",
            "second\r\n",
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
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].subject, "one");
    assert_eq!(messages[1].subject, "two");
}
