use serde_json::json;
use testa_core::assistant::{AssistantService, MessageRole, RunStatus};
use testa_interaction::OpenAIAssistantsClient;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAIAssistantsClient {
    OpenAIAssistantsClient::new("sk-test").with_base_url(format!("{}/v1", server.uri()))
}

#[tokio::test]
async fn test_create_thread_sends_auth_and_beta_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/threads"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("openai-beta", "assistants=v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "thread_abc",
            "object": "thread",
            "created_at": 1_700_000_000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let thread = client_for(&server).create_thread().await.unwrap();
    assert_eq!(thread.id, "thread_abc");
}

#[tokio::test]
async fn test_create_message_and_run_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_abc/messages"))
        .and(body_json(json!({ "role": "user", "content": "How many rows?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "role": "user",
            "content": [{ "type": "text", "text": { "value": "How many rows?", "annotations": [] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_abc/runs"))
        .and(body_json(json!({ "assistant_id": "asst_1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_1",
            "thread_id": "thread_abc",
            "status": "queued",
            "model": "gpt-4o",
            "usage": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let message = client
        .create_message("thread_abc", MessageRole::User, "How many rows?")
        .await
        .unwrap();
    assert_eq!(message.role, MessageRole::User);

    let run = client.create_run("thread_abc", "asst_1").await.unwrap();
    assert_eq!(run.id, "run_1");
    assert_eq!(run.status, RunStatus::Queued);
}

#[tokio::test]
async fn test_cancel_run_posts_to_cancel_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_abc/runs/run_1/cancel"))
        .and(header("openai-beta", "assistants=v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_1",
            "thread_id": "thread_abc",
            "status": "cancelling",
            "model": "gpt-4o"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let run = client_for(&server)
        .cancel_run("thread_abc", "run_1")
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Cancelling);
    assert!(!run.status.is_terminal());
}

#[tokio::test]
async fn test_list_runs_follows_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{
                "id": "run_2", "status": "completed", "model": "gpt-4o",
                "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
            }],
            "first_id": "run_2",
            "last_id": "run_2",
            "has_more": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs"))
        .and(query_param("after", "run_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{
                "id": "run_1", "status": "failed", "model": "gpt-4",
                "usage": { "prompt_tokens": 1, "completion_tokens": 0, "total_tokens": 1 }
            }],
            "first_id": "run_1",
            "last_id": "run_1",
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let runs = client_for(&server).list_runs("thread_abc").await.unwrap();
    let ids: Vec<_> = runs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["run_2", "run_1"]);
    assert_eq!(runs[1].status, RunStatus::Failed);
    assert_eq!(runs[0].usage.unwrap().total_tokens, 15);
}

#[tokio::test]
async fn test_list_messages_requests_ascending_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/messages"))
        .and(query_param("order", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                { "id": "msg_1", "role": "user",
                  "content": [{ "type": "text", "text": { "value": "plot it", "annotations": [] } }] },
                { "id": "msg_2", "role": "assistant",
                  "content": [{ "type": "image_file", "image_file": { "file_id": "file-img" } }] }
            ],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = client_for(&server).list_messages("thread_abc").await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(
        messages[1].content[0].image_file.as_ref().unwrap().file_id,
        "file-img"
    );
}

#[tokio::test]
async fn test_file_content_returns_raw_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/files/file-1/content"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b\n1,2\n".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = client_for(&server).file_content("file-1").await.unwrap();
    assert_eq!(bytes, b"a,b\n1,2\n");
}

#[tokio::test]
async fn test_retrieve_assistant_and_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/assistants/asst_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "asst_1",
            "object": "assistant",
            "name": "Sales analyst",
            "model": "gpt-4o",
            "tools": [{ "type": "code_interpreter" }],
            "tool_resources": { "code_interpreter": { "file_ids": ["file-1"] } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/files/file-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-1",
            "object": "file",
            "bytes": 120,
            "filename": "ventas.csv",
            "purpose": "assistants"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let assistant = client.retrieve_assistant("asst_1").await.unwrap();
    assert_eq!(assistant.name.as_deref(), Some("Sales analyst"));
    assert_eq!(assistant.code_interpreter_file_ids(), ["file-1"]);

    let file = client.retrieve_file("file-1").await.unwrap();
    assert_eq!(file.filename, "ventas.csv");
}

#[tokio::test]
async fn test_http_error_is_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/assistants/asst_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "No assistant found with id 'asst_missing'.", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .retrieve_assistant("asst_missing")
        .await
        .unwrap_err();
    assert!(err.is_remote());
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("(404)"));
    assert!(err.to_string().contains("No assistant found"));
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs/run_1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .retrieve_run("thread_abc", "run_1")
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}
