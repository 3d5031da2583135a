use crate::e2e::helpers;

use helpers::fake_provider::{self, fake_audio, ERROR_VOICE, GARBAGE_VOICE, SLOW_VOICE};
use helpers::{serve, TEST_API_KEY, TEST_MODEL};
use parking_lot::Mutex;
use std::time::Duration;
use tts_relay::domain::relay::VoiceSettings;
use tts_relay::domain::tts::SynthesisRequest;
use tts_relay::infrastructure::repositories::{HttpTtsRepository, ProviderError, TtsRepository};

async fn provider_client(api_key: Option<&str>, timeout: Duration) -> HttpTtsRepository {
    let addr = serve(fake_provider::router()).await;
    HttpTtsRepository::new(
        format!("http://{}", addr),
        api_key.map(str::to_string),
        TEST_MODEL.to_string(),
        timeout,
    )
    .unwrap()
}

fn request(voice_id: &str, text: &str) -> SynthesisRequest {
    SynthesisRequest {
        text: text.to_string(),
        voice_id: voice_id.to_string(),
        language: "en".to_string(),
        settings: VoiceSettings::default(),
    }
}

#[tokio::test]
async fn it_should_return_audio_with_progress() {
    let repo = provider_client(Some(TEST_API_KEY), Duration::from_secs(5)).await;
    let ratios = Mutex::new(Vec::new());
    let on_progress = |ratio: f32| ratios.lock().push(ratio);

    let audio = repo
        .synthesize(&request("narrator", "Good morning."), &on_progress)
        .await
        .unwrap();

    assert_eq!(audio.audio, fake_audio("Good morning."));
    assert_eq!(audio.content_type, "audio/mpeg");

    let ratios = ratios.into_inner();
    assert!(!ratios.is_empty());
    assert_eq!(ratios.last().copied(), Some(1.0));
    assert!(ratios.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn it_should_surface_json_error_message() {
    let repo = provider_client(Some(TEST_API_KEY), Duration::from_secs(5)).await;

    let err = repo
        .synthesize(&request(ERROR_VOICE, "Hello."), &|_| {})
        .await
        .unwrap_err();

    match err {
        ProviderError::Rejected { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Upload failed");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn it_should_classify_unreadable_response_as_malformed() {
    let repo = provider_client(Some(TEST_API_KEY), Duration::from_secs(5)).await;

    let err = repo
        .synthesize(&request(GARBAGE_VOICE, "Hello."), &|_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Malformed { status: 500 }));
}

#[tokio::test]
async fn it_should_send_bearer_credential() {
    let repo = provider_client(Some("wrong-key"), Duration::from_secs(5)).await;

    let err = repo
        .synthesize(&request("narrator", "Hello."), &|_| {})
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "invalid api key");
}

#[tokio::test]
async fn it_should_refuse_to_call_without_credential() {
    let repo = provider_client(None, Duration::from_secs(5)).await;

    assert!(!repo.has_credential());
    let err = repo
        .synthesize(&request("narrator", "Hello."), &|_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::CredentialMissing));
}

#[tokio::test]
async fn it_should_time_out_slow_provider() {
    let repo = provider_client(Some(TEST_API_KEY), Duration::from_millis(200)).await;

    let err = repo
        .synthesize(&request(SLOW_VOICE, "Hello."), &|_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Timeout));
}
