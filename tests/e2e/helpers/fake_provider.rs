use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::time::Duration;

use super::{TEST_API_KEY, TEST_MODEL};

/// Answers with a JSON error `{"message": "Upload failed"}`
pub const ERROR_VOICE: &str = "error-voice";
/// Answers with an HTML page
pub const GARBAGE_VOICE: &str = "garbage-voice";
/// Answers with audio, but only after `SLOW_DELAY`
pub const SLOW_VOICE: &str = "slow-voice";
pub const SLOW_DELAY: Duration = Duration::from_millis(1500);

/// Audio returned for `text`
pub fn fake_audio(text: &str) -> Vec<u8> {
    format!("AUDIO:{}", text).into_bytes()
}

pub fn router() -> Router {
    Router::new().route("/v1/text-to-speech/:voice_id", post(synthesize))
}

async fn synthesize(
    Path(voice_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {}", TEST_API_KEY))
        .unwrap_or(false);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": {"message": "invalid api key"}})),
        )
            .into_response();
    }

    if body.get("model").and_then(Value::as_str) != Some(TEST_MODEL)
        || body.get("voice_settings").is_none()
        || body.get("language").and_then(Value::as_str).is_none()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "malformed synthesis request"})),
        )
            .into_response();
    }

    let text = body
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match voice_id.as_str() {
        ERROR_VOICE => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "Upload failed"})),
        )
            .into_response(),
        GARBAGE_VOICE => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/html")],
            "<html>oops</html>",
        )
            .into_response(),
        SLOW_VOICE => {
            tokio::time::sleep(SLOW_DELAY).await;
            audio_response(&text)
        }
        _ => audio_response(&text),
    }
}

fn audio_response(text: &str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        fake_audio(text),
    )
        .into_response()
}
