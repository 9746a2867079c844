use async_trait::async_trait;
use ingest::{ImageRef, UploadedImage};
use std::time::Duration;

use crate::error::OracleError;

/// Turns a stored image reference back into bytes for comparison.
#[async_trait]
pub trait CandidateImageLoader: Send + Sync {
    async fn load(&self, image: &ImageRef) -> Result<UploadedImage, OracleError>;
}

/// Decodes inline references locally and fetches URL references over HTTP.
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: reqwest::Client,
    max_bytes: Option<usize>,
}

impl HttpImageLoader {
    pub fn new(timeout: Option<Duration>, max_bytes: Option<usize>) -> Result<Self, OracleError> {
        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| OracleError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, max_bytes })
    }
}

/// Decode an inline reference; `Ok(None)` for URLs.
pub fn load_inline(image: &ImageRef) -> Result<Option<UploadedImage>, OracleError> {
    image
        .decode_inline()
        .map_err(|e| OracleError::ImageLoad(e.to_string()))
}

fn oversized(len: u64, limit: usize) -> OracleError {
    OracleError::ImageLoad(format!("candidate image is at least {len} bytes, limit {limit}"))
}

#[async_trait]
impl CandidateImageLoader for HttpImageLoader {
    async fn load(&self, image: &ImageRef) -> Result<UploadedImage, OracleError> {
        if let Some(decoded) = load_inline(image)? {
            return Ok(decoded);
        }
        let ImageRef::Url(url) = image else {
            return Err(OracleError::ImageLoad("unsupported image reference".into()));
        };
        if url.trim().is_empty() {
            return Err(OracleError::ImageLoad("candidate has no stored image".into()));
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| OracleError::ImageLoad(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::ImageLoad(format!("GET {url} returned {status}")));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| "image/jpeg".to_string());

        if let (Some(limit), Some(declared)) = (self.max_bytes, response.content_length()) {
            if declared > limit as u64 {
                return Err(oversized(declared, limit));
            }
        }

        // Read chunk by chunk so an undeclared or lying length still stops at the cap.
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| OracleError::ImageLoad(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
            if let Some(limit) = self.max_bytes {
                if bytes.len() > limit {
                    return Err(oversized(bytes.len() as u64, limit));
                }
            }
        }
        if bytes.is_empty() {
            return Err(OracleError::ImageLoad(format!("GET {url} returned no bytes")));
        }
        Ok(UploadedImage::new(bytes, mime_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(head: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/photo.png")
    }

    #[tokio::test]
    async fn declared_oversized_body_is_refused() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 4096\r\nConnection: close\r\n\r\n",
            vec![1u8; 4096],
        )
        .await;
        let loader = HttpImageLoader::new(Some(Duration::from_secs(5)), Some(1024)).unwrap();
        let err = loader.load(&ImageRef::Url(url)).await.unwrap_err();
        assert!(matches!(err, OracleError::ImageLoad(msg) if msg.contains("limit 1024")));
    }

    #[tokio::test]
    async fn undeclared_length_is_capped_while_reading() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nConnection: close\r\n\r\n",
            vec![2u8; 4096],
        )
        .await;
        let loader = HttpImageLoader::new(Some(Duration::from_secs(5)), Some(1024)).unwrap();
        let err = loader.load(&ImageRef::Url(url)).await.unwrap_err();
        assert!(matches!(err, OracleError::ImageLoad(msg) if msg.contains("limit 1024")));
    }

    #[tokio::test]
    async fn small_image_is_loaded_with_its_content_type() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 3\r\nConnection: close\r\n\r\n",
            vec![7u8, 8, 9],
        )
        .await;
        let loader = HttpImageLoader::new(Some(Duration::from_secs(5)), Some(1024)).unwrap();
        let loaded = loader.load(&ImageRef::Url(url)).await.unwrap();
        assert_eq!(loaded, UploadedImage::new(vec![7u8, 8, 9], "image/png"));
    }

    #[tokio::test]
    async fn inline_refs_are_decoded_without_network() {
        let original = UploadedImage::new(vec![9u8, 8, 7], "image/png");
        let loader = HttpImageLoader::new(None, None).unwrap();
        let loaded = loader.load(&ImageRef::inline(&original)).await.unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn corrupt_inline_payload_is_a_load_error() {
        let loader = HttpImageLoader::new(None, None).unwrap();
        let bad = ImageRef::parse("data:image/png;base64,!!!not-base64!!!");
        let err = loader.load(&bad).await.unwrap_err();
        assert!(matches!(err, OracleError::ImageLoad(_)));
    }

    #[tokio::test]
    async fn empty_url_is_a_load_error() {
        let loader = HttpImageLoader::new(None, None).unwrap();
        let err = loader.load(&ImageRef::Url(String::new())).await.unwrap_err();
        assert!(matches!(err, OracleError::ImageLoad(msg) if msg.contains("no stored image")));
    }
}
