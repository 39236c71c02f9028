use std::time::Duration;

use core_test_support::load_default_config_for_test;
use core_test_support::responses::assistant;
use core_test_support::responses::bot;
use core_test_support::responses::json_response;
use core_test_support::responses::mount_conversation;
use core_test_support::responses::mount_escalation_status;
use core_test_support::responses::mount_listing;
use core_test_support::responses::mount_request;
use core_test_support::responses::start_mock_server;
use core_test_support::responses::student;
use core_test_support::responses::wire_message;
use pretty_assertions::assert_eq;
use scotty_core::ChatBackend;
use scotty_core::ChatErr;
use scotty_core::Failure;
use scotty_core::HttpBackend;
use scotty_core::backend::ListScope;
use scotty_core::backend::is_not_found;
use scotty_protocol::models::ConversationId;
use scotty_protocol::models::ConversationSummary;
use scotty_protocol::models::CourseId;
use scotty_protocol::models::Message;
use scotty_protocol::responses::RedirectStatus;
use serde_json::json;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::header;
use wiremock::matchers::header_regex;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn backend_for(server: &MockServer) -> (TempDir, HttpBackend) {
    let home = TempDir::new().expect("tempdir");
    let config = load_default_config_for_test(&home, &server.uri());
    let backend = HttpBackend::new(&config);
    (home, backend)
}

#[tokio::test]
async fn every_request_carries_json_and_client_headers() -> anyhow::Result<()> {
    let server = start_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/conversation/7"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .and(header("originator", "scotty_cli_rs"))
        .and(header_regex("user-agent", r"^scotty_cli_rs/"))
        .and(body_json(json!({ "type": "conversation" })))
        .respond_with(json_response(json!({ "messages": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let (_home, backend) = backend_for(&server);
    let messages = backend.load_conversation(ConversationId(7)).await?;
    assert!(messages.is_empty());
    Ok(())
}

#[tokio::test]
async fn lists_ids_and_titled_entries() -> anyhow::Result<()> {
    let server = start_mock_server().await;
    mount_listing(
        &server,
        3,
        json!([4, { "id": 9, "title": "Pointers" }, { "id": 11, "title": "  " }]),
    )
    .await;
    mount_listing(&server, 0, json!([12])).await;

    let (_home, backend) = backend_for(&server);
    let course = backend
        .list_conversations(ListScope::Course(CourseId(3)))
        .await?;
    assert_eq!(
        course,
        vec![
            ConversationSummary::new(ConversationId(4), None),
            ConversationSummary::new(ConversationId(9), Some("Pointers")),
            ConversationSummary::new(ConversationId(11), None),
        ]
    );
    assert_eq!(course[2].label, "Conversation 11");

    let user = backend.list_conversations(ListScope::User).await?;
    assert_eq!(user, vec![ConversationSummary::new(ConversationId(12), None)]);
    Ok(())
}

#[tokio::test]
async fn loads_messages_with_decoded_senders() -> anyhow::Result<()> {
    let server = start_mock_server().await;
    mount_conversation(
        &server,
        7,
        vec![
            student("how do I free memory?"),
            bot("Call `free`."),
            assistant("And set the pointer to NULL."),
            json!({ "sender": null, "body": "legacy row" }),
            wire_message("SomethingElse", "future sender"),
        ],
    )
    .await;

    let (_home, backend) = backend_for(&server);
    let messages = backend.load_conversation(ConversationId(7)).await?;
    assert_eq!(
        messages,
        vec![
            Message::student("how do I free memory?"),
            Message::bot("Call `free`."),
            Message::assistant("And set the pointer to NULL."),
            Message::bot("legacy row"),
            Message::bot("future sender"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn creates_a_conversation_in_the_course() -> anyhow::Result<()> {
    let server = start_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/conversation/new/3/chat"))
        .and(body_json(json!({ "type": "create", "message": "hello" })))
        .respond_with(json_response(
            json!({ "conversationId": 42, "title": "Greeting" }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let (_home, backend) = backend_for(&server);
    let created = backend.create_conversation(CourseId(3), "hello").await?;
    assert_eq!(created.id, ConversationId(42));
    assert_eq!(created.title.as_deref(), Some("Greeting"));
    Ok(())
}

#[tokio::test]
async fn send_and_reply_use_the_conversation_endpoint() -> anyhow::Result<()> {
    let server = start_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/conversation/7"))
        .and(body_json(json!({ "type": "send", "message": "why?" })))
        .respond_with(json_response(json!({ "status": "sent" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/conversation/7"))
        .and(body_json(json!({ "type": "reply", "message": "why?" })))
        .respond_with(json_response(json!({ "reply": "Because." })))
        .expect(1)
        .mount(&server)
        .await;

    let (_home, backend) = backend_for(&server);
    backend.send_message(ConversationId(7), "why?").await?;
    let reply = backend.get_reply(ConversationId(7), "why?").await?;
    assert_eq!(reply, "Because.");
    Ok(())
}

#[tokio::test]
async fn assistant_messages_post_to_the_assistant_endpoint() -> anyhow::Result<()> {
    let server = start_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/assistant/conversation/7/send"))
        .and(body_json(
            json!({ "type": "assistant_message", "message": "see slide 4" }),
        ))
        .respond_with(json_response(
            json!({ "status": "sent", "message": "Assistant message sent successfully" }),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/assistant/conversation/8/send"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "error": "Unauthorized" })),
        )
        .mount(&server)
        .await;

    let (_home, backend) = backend_for(&server);
    backend
        .send_assistant_message(ConversationId(7), "see slide 4")
        .await?;
    let err = backend
        .send_assistant_message(ConversationId(8), "hello")
        .await
        .expect_err("forbidden send should fail");
    assert_eq!(err.classify(), Failure::TransportFailure);
    Ok(())
}

#[tokio::test]
async fn empty_reply_means_redirected() {
    let server = start_mock_server().await;
    mount_request(
        &server,
        "/conversation/7",
        "reply",
        json_response(json!({ "reply": "" })),
    )
    .await;

    let (_home, backend) = backend_for(&server);
    let err = backend
        .get_reply(ConversationId(7), "hello?")
        .await
        .expect_err("empty reply should fail");
    assert_eq!(err.classify(), Failure::ConversationRedirected);
}

#[tokio::test]
async fn redirect_and_resolve_report_their_status() -> anyhow::Result<()> {
    let server = start_mock_server().await;
    mount_request(
        &server,
        "/conversation/7/redirect",
        "redirect",
        json_response(json!({ "status": "redirected" })),
    )
    .await;
    mount_request(
        &server,
        "/conversation/7/resolve",
        "resolve",
        json_response(json!({ "status": "resolved" })),
    )
    .await;
    mount_request(
        &server,
        "/conversation/8/redirect",
        "redirect",
        json_response(json!({ "status": "resolved" })),
    )
    .await;

    let (_home, backend) = backend_for(&server);
    backend.redirect(ConversationId(7)).await?;
    backend.resolve(ConversationId(7)).await?;
    let err = backend
        .redirect(ConversationId(8))
        .await
        .expect_err("resolved conversations cannot be redirected");
    assert_eq!(err.classify(), Failure::ConversationResolved);
    Ok(())
}

#[tokio::test]
async fn escalation_status_decodes_labels_and_flags() -> anyhow::Result<()> {
    let server = start_mock_server().await;
    mount_escalation_status(&server, 1, json!("bot")).await;
    mount_escalation_status(&server, 2, json!("open")).await;
    mount_escalation_status(&server, 3, json!("closed")).await;
    mount_escalation_status(&server, 4, json!(false)).await;

    let (_home, backend) = backend_for(&server);
    let mut statuses = Vec::new();
    for id in 1..=4 {
        statuses.push(backend.escalation_status(ConversationId(id)).await?);
    }
    assert_eq!(
        statuses,
        vec![
            RedirectStatus::Bot,
            RedirectStatus::Open,
            RedirectStatus::Closed,
            RedirectStatus::Unknown,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn http_failures_are_classified() {
    let server = start_mock_server().await;
    mount_request(
        &server,
        "/conversation/7",
        "reply",
        ResponseTemplate::new(403).set_body_json(json!({ "error": "Conversation redirected" })),
    )
    .await;
    mount_request(
        &server,
        "/conversation/8",
        "send",
        ResponseTemplate::new(400).set_body_json(json!({ "error": "Conversation is closed" })),
    )
    .await;
    mount_request(
        &server,
        "/conversation/9",
        "conversation",
        ResponseTemplate::new(404).set_body_string("not found"),
    )
    .await;
    mount_request(
        &server,
        "/conversation/10",
        "send",
        json_response(json!({ "error": "Invalid request type" })),
    )
    .await;

    let (_home, backend) = backend_for(&server);

    let redirected = backend
        .get_reply(ConversationId(7), "hi")
        .await
        .expect_err("403 should fail");
    assert_eq!(redirected.classify(), Failure::ConversationRedirected);

    let resolved = backend
        .send_message(ConversationId(8), "hi")
        .await
        .expect_err("400 should fail");
    assert_eq!(resolved.classify(), Failure::ConversationResolved);

    let missing = backend
        .load_conversation(ConversationId(9))
        .await
        .expect_err("404 should fail");
    assert!(is_not_found(&missing));
    assert_eq!(missing.classify(), Failure::TransportFailure);

    let invalid = backend
        .send_message(ConversationId(10), "hi")
        .await
        .expect_err("error body should fail");
    assert!(matches!(invalid, ChatErr::Backend(ref reason) if reason == "Invalid request type"));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_failure() {
    let server = start_mock_server().await;
    let uri = server.uri();
    drop(server);

    let home = TempDir::new().expect("tempdir");
    let mut config = load_default_config_for_test(&home, &uri);
    config.request_timeout = Some(Duration::from_secs(2));
    let backend = HttpBackend::new(&config);

    let err = backend
        .load_conversation(ConversationId(1))
        .await
        .expect_err("connection should fail");
    assert_eq!(err.classify(), Failure::TransportFailure);
}
