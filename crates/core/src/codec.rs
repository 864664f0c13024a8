// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serializer boundary
//!
//! Channels are handed a [`Serializers`] strategy at construction time and
//! keep it for their whole life; nothing is resolved from global state per
//! message. Decoding is async because codecs may delegate to remote schema
//! lookups.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced by a single codec
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("missing payload")]
    Missing,
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A decode failure, tagged with the half of the record that failed
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot decode key: {0}")]
    Key(#[source] CodecError),
    #[error("cannot decode value: {0}")]
    Value(#[source] CodecError),
}

/// Turns raw bytes into `T` and back
#[async_trait]
pub trait Codec<T>: Send + Sync {
    async fn loads(&self, bytes: Option<&[u8]>) -> Result<T, CodecError>;

    fn dumps(&self, value: &T) -> Result<Vec<u8>, CodecError>;
}

/// JSON codec for any serde type
///
/// A missing payload decodes as JSON `null`, so `Option<T>` keys accept
/// records without a key.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    async fn loads(&self, bytes: Option<&[u8]>) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes.unwrap_or(b"null"))?)
    }

    fn dumps(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }
}

/// Pass-through codec; a missing payload decodes as empty bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

#[async_trait]
impl Codec<Vec<u8>> for RawCodec {
    async fn loads(&self, bytes: Option<&[u8]>) -> Result<Vec<u8>, CodecError> {
        Ok(bytes.map(<[u8]>::to_vec).unwrap_or_default())
    }

    fn dumps(&self, value: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(value.clone())
    }
}

/// UTF-8 string codec
#[derive(Debug, Clone, Copy, Default)]
pub struct StrCodec;

#[async_trait]
impl Codec<String> for StrCodec {
    async fn loads(&self, bytes: Option<&[u8]>) -> Result<String, CodecError> {
        let bytes = bytes.ok_or(CodecError::Missing)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| CodecError::Malformed(e.to_string()))
    }

    fn dumps(&self, value: &String) -> Result<Vec<u8>, CodecError> {
        Ok(value.as_bytes().to_vec())
    }
}

/// Key and value codecs captured once per channel
pub struct Serializers<K, V> {
    key: Arc<dyn Codec<K>>,
    value: Arc<dyn Codec<V>>,
}

impl<K, V> Serializers<K, V> {
    pub fn new(key: impl Codec<K> + 'static, value: impl Codec<V> + 'static) -> Self {
        Self {
            key: Arc::new(key),
            value: Arc::new(value),
        }
    }

    pub fn from_shared(key: Arc<dyn Codec<K>>, value: Arc<dyn Codec<V>>) -> Self {
        Self { key, value }
    }

    pub async fn loads_key(&self, bytes: Option<&[u8]>) -> Result<K, DecodeError> {
        self.key.loads(bytes).await.map_err(DecodeError::Key)
    }

    pub async fn loads_value(&self, bytes: Option<&[u8]>) -> Result<V, DecodeError> {
        self.value.loads(bytes).await.map_err(DecodeError::Value)
    }

    pub fn dumps_key(&self, key: &K) -> Result<Vec<u8>, CodecError> {
        self.key.dumps(key)
    }

    pub fn dumps_value(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        self.value.dumps(value)
    }

    pub fn key_codec(&self) -> &Arc<dyn Codec<K>> {
        &self.key
    }

    pub fn value_codec(&self) -> &Arc<dyn Codec<V>> {
        &self.value
    }
}

impl<K, V> Serializers<K, V>
where
    K: Serialize + DeserializeOwned + Send + 'static,
    V: Serialize + DeserializeOwned + Send + 'static,
{
    /// JSON for both key and value
    pub fn json() -> Self {
        Self::new(JsonCodec::new(), JsonCodec::new())
    }
}

impl<K, V> Clone for Serializers<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            value: Arc::clone(&self.value),
        }
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
