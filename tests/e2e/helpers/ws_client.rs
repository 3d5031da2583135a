use anyhow::{anyhow, bail, Result};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tts_relay::domain::relay::{Envelope, TtsRequestPayload, VoiceSettings};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw WebSocket client speaking envelopes
pub struct WsClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let (socket, _) = connect_async(ws_url).await?;
        Ok(Self { socket })
    }

    pub async fn send(&mut self, envelope: &Envelope) -> Result<()> {
        self.send_text(&envelope.to_json()?).await
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.socket.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Next raw frame, control frames included
    pub async fn next_frame(&mut self) -> Result<Message> {
        let frame = tokio::time::timeout(RECV_TIMEOUT, self.socket.next())
            .await
            .map_err(|_| anyhow!("no frame within {:?}", RECV_TIMEOUT))?
            .ok_or_else(|| anyhow!("connection closed"))??;
        Ok(frame)
    }

    /// Next envelope, skipping control frames
    pub async fn recv(&mut self) -> Result<Envelope> {
        loop {
            match self.next_frame().await? {
                Message::Text(text) => return Ok(Envelope::from_json(&text)?),
                Message::Close(_) => bail!("connection closed"),
                _ => continue,
            }
        }
    }

    /// Collect progress envelopes until the response or error that ends a chunk
    pub async fn recv_until_final(&mut self) -> Result<(Vec<Envelope>, Envelope)> {
        let mut progress = Vec::new();
        loop {
            match self.recv().await? {
                envelope @ (Envelope::TtsResponse(_) | Envelope::Error(_)) => {
                    return Ok((progress, envelope))
                }
                envelope => progress.push(envelope),
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.socket.close(None).await?;
        Ok(())
    }
}

pub fn tts_request(chunk_id: &str, voice_id: &str, text: &str) -> Envelope {
    Envelope::TtsRequest(TtsRequestPayload {
        voice_id: voice_id.to_string(),
        text: text.to_string(),
        language: Some("en".to_string()),
        settings: VoiceSettings::default(),
        chunk_id: Some(chunk_id.to_string()),
        total_chunks: Some(1),
        entry_index: Some(0),
        chunk_index: Some(0),
    })
}
