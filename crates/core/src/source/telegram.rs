//! Telegram Bot API sticker source and messenger.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::metrics;

use super::{MessageRef, Messenger, SourceError, Sticker, StickerKind, StickerSet, StickerSource};

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiStickerSet {
    name: String,
    title: String,
    stickers: Vec<ApiSticker>,
}

#[derive(Debug, Deserialize)]
struct ApiSticker {
    file_id: String,
    file_unique_id: String,
    width: u32,
    height: u32,
    #[serde(default)]
    is_animated: bool,
    #[serde(default)]
    is_video: bool,
    emoji: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message_id: i64,
    chat: ApiChat,
}

#[derive(Debug, Deserialize)]
struct ApiChat {
    id: i64,
}

impl From<ApiSticker> for Sticker {
    fn from(s: ApiSticker) -> Self {
        let kind = if s.is_animated {
            StickerKind::Animated
        } else if s.is_video {
            StickerKind::Video
        } else {
            StickerKind::Static
        };
        Sticker {
            file_id: s.file_id,
            file_unique_id: s.file_unique_id,
            kind,
            width: s.width,
            height: s.height,
            emoji: s.emoji,
        }
    }
}

/// Telegram Bot API client.
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    /// Create a new Telegram client.
    pub fn new(config: TelegramConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SourceError::ConnectionFailed(format!("HTTP client init failed: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.api_base_url.trim_end_matches('/')
    }

    /// Build the API endpoint URL for a method.
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url(), self.config.bot_token, method)
    }

    /// Build the download URL for a server-side file path.
    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.base_url(),
            self.config.bot_token,
            file_path.trim_start_matches('/')
        )
    }

    /// Resolves a file id into its server-side download path.
    async fn get_file_path(&self, file_id: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .post(self.method_url("getFile"))
            .json(&json!({ "file_id": file_id }))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let file: ApiFile = parse_envelope("getFile", response).await?;
        file.file_path
            .ok_or_else(|| SourceError::InvalidResponse("getFile returned no file_path".into()))
    }
}

/// Classifies a transport error.
fn map_reqwest_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() || e.is_request() || e.is_body() {
        SourceError::ConnectionFailed(e.to_string())
    } else if let Some(status) = e.status() {
        SourceError::from_status(status.as_u16(), e.to_string())
    } else {
        SourceError::InvalidResponse(e.to_string())
    }
}

/// Unwraps a Bot API envelope, mapping `ok: false` into a classified error.
async fn parse_envelope<T: DeserializeOwned>(
    method: &'static str,
    response: Response,
) -> Result<T, SourceError> {
    let status = response.status();
    let body = response.text().await.map_err(map_reqwest_error)?;
    let result = decode_envelope(status.as_u16(), &body);
    metrics::TELEGRAM_REQUESTS
        .with_label_values(&[method, if result.is_ok() { "ok" } else { "error" }])
        .inc();
    result
}

fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, SourceError> {
    let envelope: ApiResponse<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if (200..300).contains(&status) => {
            return Err(SourceError::InvalidResponse(format!(
                "failed to decode response: {}",
                e
            )));
        }
        Err(_) => {
            return Err(SourceError::from_status(
                status,
                body.chars().take(200).collect::<String>(),
            ));
        }
    };

    if envelope.ok {
        return envelope
            .result
            .ok_or_else(|| SourceError::InvalidResponse("missing result".into()));
    }

    let code = envelope.error_code.unwrap_or(status);
    if code == 429 {
        return Err(SourceError::RateLimited {
            retry_after_secs: envelope.parameters.and_then(|p| p.retry_after),
        });
    }

    Err(SourceError::from_status(
        code,
        envelope
            .description
            .unwrap_or_else(|| "unknown error".to_string()),
    ))
}

#[async_trait]
impl StickerSource for TelegramClient {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn get_sticker_set(&self, name: &str) -> Result<StickerSet, SourceError> {
        let response = self
            .client
            .post(self.method_url("getStickerSet"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let set: ApiStickerSet = parse_envelope("getStickerSet", response).await?;
        debug!(set = %set.name, stickers = set.stickers.len(), "Fetched sticker set");

        Ok(StickerSet {
            name: set.name,
            title: set.title,
            stickers: set.stickers.into_iter().map(Sticker::from).collect(),
        })
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, SourceError> {
        let file_path = self.get_file_path(file_id).await?;

        let response = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::from_status(
                status.as_u16(),
                format!("file download failed: HTTP {}", status),
            ));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(file_id, bytes = written, "Downloaded sticker file");
        Ok(written)
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
    ) -> Result<MessageRef, SourceError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "stickers.zip".to_string());
        let bytes = tokio::fs::read(path).await?;

        let form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let message: ApiMessage = parse_envelope("sendDocument", response).await?;
        Ok(MessageRef {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), SourceError> {
        let response = self
            .client
            .post(self.method_url("deleteMessage"))
            .json(&json!({
                "chat_id": message.chat_id,
                "message_id": message.message_id,
            }))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let _: bool = parse_envelope("deleteMessage", response).await?;
        Ok(())
    }
}
