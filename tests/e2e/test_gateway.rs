use crate::e2e::helpers;

use helpers::fake_provider::{fake_audio, ERROR_VOICE, GARBAGE_VOICE};
use helpers::ws_client::{tts_request, WsClient};
use helpers::TestContext;
use pretty_assertions::assert_eq;
use test_context::test_context;
use tts_relay::domain::relay::{
    ConnectionStatus, Envelope, ProgressStatus, TtsRequestPayload, VoiceSettings,
};

async fn open(ctx: &TestContext) -> WsClient {
    let mut ws = WsClient::connect(&ctx.ws_url).await.unwrap();
    match ws.recv().await.unwrap() {
        Envelope::ConnectionStatus(status) => assert_eq!(status.status, ConnectionStatus::Connected),
        other => panic!("expected connection_status, got {:?}", other),
    }
    ws
}

fn expect_error(envelope: Envelope) -> (String, Option<String>, Option<String>) {
    match envelope {
        Envelope::Error(payload) => (payload.message, payload.code, payload.chunk_id),
        other => panic!("expected error envelope, got {:?}", other),
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_greet_with_connected_status(ctx: &TestContext) {
    let ws = open(ctx).await;
    ws.close().await.unwrap();
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_relay_audio_for_a_chunk(ctx: &TestContext) {
    let mut ws = open(ctx).await;

    ws.send(&tts_request("chunk-1", "narrator", "Hello there."))
        .await
        .unwrap();
    let (progress, response) = ws.recv_until_final().await.unwrap();

    match &progress[0] {
        Envelope::Progress(payload) => {
            assert_eq!(payload.status, ProgressStatus::Starting);
            assert_eq!(payload.chunk_id.as_deref(), Some("chunk-1"));
            assert_eq!(payload.message.as_deref(), Some("Synthesizing chunk 1/1"));
        }
        other => panic!("expected starting progress, got {:?}", other),
    }
    for envelope in &progress[1..] {
        match envelope {
            Envelope::Progress(payload) => {
                assert_eq!(payload.status, ProgressStatus::Downloading);
                let ratio = payload.progress.unwrap();
                assert!((0.0..=1.0).contains(&ratio));
            }
            other => panic!("expected downloading progress, got {:?}", other),
        }
    }

    match response {
        Envelope::TtsResponse(payload) => {
            assert!(payload.success);
            assert_eq!(payload.chunk_id.as_deref(), Some("chunk-1"));
            assert_eq!(payload.content_type, "audio/mpeg");
            assert_eq!(payload.decode_audio().unwrap().audio, fake_audio("Hello there."));
        }
        other => panic!("expected tts_response, got {:?}", other),
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_detect_language_when_missing(ctx: &TestContext) {
    let mut ws = open(ctx).await;

    ws.send(&Envelope::TtsRequest(TtsRequestPayload {
        voice_id: "narrator".to_string(),
        text: "Bonjour tout le monde, comment allez-vous aujourd'hui ?".to_string(),
        language: None,
        settings: VoiceSettings::default(),
        chunk_id: Some("auto".to_string()),
        total_chunks: None,
        entry_index: None,
        chunk_index: None,
    }))
    .await
    .unwrap();

    let (_, response) = ws.recv_until_final().await.unwrap();
    assert!(matches!(response, Envelope::TtsResponse(ref payload) if payload.success));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_forward_provider_error_message(ctx: &TestContext) {
    let mut ws = open(ctx).await;

    ws.send(&tts_request("chunk-err", ERROR_VOICE, "Anything."))
        .await
        .unwrap();
    let (_, response) = ws.recv_until_final().await.unwrap();

    let (message, code, chunk_id) = expect_error(response);
    assert_eq!(message, "Upload failed");
    assert_eq!(code.as_deref(), Some("provider_error"));
    assert_eq!(chunk_id.as_deref(), Some("chunk-err"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_unreadable_provider_response(ctx: &TestContext) {
    let mut ws = open(ctx).await;

    ws.send(&tts_request("chunk-garbage", GARBAGE_VOICE, "Anything."))
        .await
        .unwrap();
    let (_, response) = ws.recv_until_final().await.unwrap();

    let (_, code, chunk_id) = expect_error(response);
    assert_eq!(code.as_deref(), Some("provider_error"));
    assert_eq!(chunk_id.as_deref(), Some("chunk-garbage"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_text(ctx: &TestContext) {
    let mut ws = open(ctx).await;

    ws.send(&tts_request("chunk-empty", "narrator", "   "))
        .await
        .unwrap();
    let (_, response) = ws.recv_until_final().await.unwrap();

    let (_, code, chunk_id) = expect_error(response);
    assert_eq!(code.as_deref(), Some("bad_request"));
    assert_eq!(chunk_id.as_deref(), Some("chunk-empty"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_connection_open_after_malformed_envelope(ctx: &TestContext) {
    let mut ws = open(ctx).await;

    ws.send_text("{not json").await.unwrap();
    let (_, code, chunk_id) = expect_error(ws.recv().await.unwrap());
    assert_eq!(code.as_deref(), Some("bad_request"));
    assert_eq!(chunk_id, None);

    ws.send(&tts_request("after", "narrator", "Still here."))
        .await
        .unwrap();
    let (_, response) = ws.recv_until_final().await.unwrap();
    assert!(matches!(response, Envelope::TtsResponse(_)));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_envelopes_clients_may_not_send(ctx: &TestContext) {
    let mut ws = open(ctx).await;

    ws.send(&Envelope::connected()).await.unwrap();
    let (_, code, _) = expect_error(ws.recv().await.unwrap());
    assert_eq!(code.as_deref(), Some("bad_request"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_answer_only_the_issuing_connection(ctx: &TestContext) {
    let mut first = open(ctx).await;
    let mut second = open(ctx).await;

    first
        .send(&tts_request("from-first", "narrator", "First."))
        .await
        .unwrap();
    second
        .send(&tts_request("from-second", "narrator", "Second."))
        .await
        .unwrap();

    let (_, first_response) = first.recv_until_final().await.unwrap();
    let (_, second_response) = second.recv_until_final().await.unwrap();

    assert_eq!(first_response.chunk_id(), Some("from-first"));
    assert_eq!(second_response.chunk_id(), Some("from-second"));
}

#[tokio::test]
async fn it_should_fail_fast_without_provider_credential() {
    let ctx = TestContext::start(None).await;
    let mut ws = open(&ctx).await;

    ws.send(&tts_request("chunk-nokey", "narrator", "Hello."))
        .await
        .unwrap();
    let (progress, response) = ws.recv_until_final().await.unwrap();

    let (message, code, chunk_id) = expect_error(response);
    assert_eq!(message, "credential missing");
    assert_eq!(code.as_deref(), Some("credential_missing"));
    assert_eq!(chunk_id.as_deref(), Some("chunk-nokey"));
    // The error is the first thing sent for the chunk
    assert!(progress.is_empty(), "unexpected progress: {:?}", progress);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_relay_non_ascii_text(ctx: &TestContext) {
    let mut ws = open(ctx).await;
    let text = "Grüße aus Köln, señor.";

    ws.send(&tts_request("chunk-utf8", "narrator", text))
        .await
        .unwrap();
    let (_, response) = ws.recv_until_final().await.unwrap();

    match response {
        Envelope::TtsResponse(payload) => {
            assert_eq!(payload.chunk_id.as_deref(), Some("chunk-utf8"));
            assert_eq!(payload.decode_audio().unwrap().audio, fake_audio(text));
        }
        other => panic!("expected tts_response, got {:?}", other),
    }
}
