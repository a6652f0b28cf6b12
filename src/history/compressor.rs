use crate::config::HistoryConfig;
use crate::error::HistoryError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use std::sync::Arc;

/// Archive payload encoding. Chosen once when the optimizer is built.
pub trait Compressor: Send + Sync {
    fn name(&self) -> &str;

    /// Encode a JSON document for the archive store.
    fn compress(&self, json: &str) -> Result<String, HistoryError>;

    /// Decode a stored payload back into JSON. Payloads are self-describing,
    /// so every implementation reads both encodings.
    fn decompress(&self, payload: &str) -> Result<String, HistoryError> {
        decode_payload(payload)
    }
}

/// Gzip the JSON and store it as standard base64.
#[cfg(feature = "gzip")]
#[derive(Debug, Default, Clone, Copy)]
pub struct GzipCompressor;

#[cfg(feature = "gzip")]
impl Compressor for GzipCompressor {
    fn name(&self) -> &str {
        "gzip"
    }

    fn compress(&self, json: &str) -> Result<String, HistoryError> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(json.as_bytes())
            .map_err(|e| HistoryError::Compress(e.to_string()))?;
        let bytes = encoder
            .finish()
            .map_err(|e| HistoryError::Compress(e.to_string()))?;
        Ok(BASE64_STANDARD.encode(bytes))
    }
}

/// Store the JSON as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughCompressor;

impl Compressor for PassthroughCompressor {
    fn name(&self) -> &str {
        "none"
    }

    fn compress(&self, json: &str) -> Result<String, HistoryError> {
        Ok(json.to_string())
    }
}

/// Factory: pick the archive encoding from config.
pub fn create_compressor(config: &HistoryConfig) -> Arc<dyn Compressor> {
    match config.compression.as_str() {
        "none" | "passthrough" => Arc::new(PassthroughCompressor),
        "gzip" => best_available(),
        other => {
            tracing::warn!("Unknown history compression '{other}', using best available");
            best_available()
        }
    }
}

#[cfg(feature = "gzip")]
fn best_available() -> Arc<dyn Compressor> {
    Arc::new(GzipCompressor)
}

#[cfg(not(feature = "gzip"))]
fn best_available() -> Arc<dyn Compressor> {
    tracing::debug!("gzip support not compiled in, storing archives uncompressed");
    Arc::new(PassthroughCompressor)
}

/// True when `payload` survives a base64 decode/re-encode round trip
/// unchanged, i.e. it was written by the gzip encoder.
pub fn is_base64_payload(payload: &str) -> bool {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return false;
    }
    BASE64_STANDARD
        .decode(trimmed)
        .is_ok_and(|bytes| BASE64_STANDARD.encode(bytes) == trimmed)
}

/// Decode either archive encoding into JSON text.
///
/// A payload that looks like base64 but does not gunzip is handed back
/// raw, leaving the JSON parse to reject it.
pub fn decode_payload(payload: &str) -> Result<String, HistoryError> {
    if !is_base64_payload(payload) {
        return Ok(payload.to_string());
    }
    match gunzip_base64(payload.trim()) {
        Ok(json) => Ok(json),
        Err(HistoryError::CompressionUnavailable) => Err(HistoryError::CompressionUnavailable),
        Err(err) => {
            tracing::warn!("archive payload looked compressed but did not inflate: {err}");
            Ok(payload.to_string())
        }
    }
}

#[cfg(feature = "gzip")]
fn gunzip_base64(payload: &str) -> Result<String, HistoryError> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let bytes = BASE64_STANDARD
        .decode(payload)
        .map_err(|e| HistoryError::Decompress(e.to_string()))?;
    let mut json = String::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_string(&mut json)
        .map_err(|e| HistoryError::Decompress(e.to_string()))?;
    Ok(json)
}

#[cfg(not(feature = "gzip"))]
fn gunzip_base64(_payload: &str) -> Result<String, HistoryError> {
    Err(HistoryError::CompressionUnavailable)
}
