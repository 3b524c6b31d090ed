//! Signing Backend Client
//!
//! [`SigningBackend`] implementation speaking the JSON wire format of
//! `tss-wire` over HTTP.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use tss_coordinator::backend::{async_trait, CallContext, SigningBackend};
use tss_coordinator::{
    KeyUid, Outcome, PartyUid, PayloadHash, PublicKey, Signature, TransportError,
};
use tss_wire::{
    classify_keygen, classify_sign, KeygenRequest, SignRequest, KEYGEN_PATH, SIGN_PATH,
};

/// HTTP-based signing backend client
#[derive(Clone)]
pub struct HttpBackend {
    /// HTTP client
    client: Client,
    /// Backend service URL
    url: String,
}

impl HttpBackend {
    /// Create a new client for the backend at `url`
    pub fn new(url: &str) -> Self {
        Self::with_client(url, Client::new())
    }

    /// Create a client reusing an existing connection pool
    pub fn with_client(url: &str, client: Client) -> Self {
        Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `body` to `path` and return the parsed JSON answer
    #[instrument(skip(self, ctx, body))]
    async fn post<T: Serialize + ?Sized>(
        &self,
        ctx: &CallContext,
        path: &str,
        body: &T,
    ) -> Result<Value, TransportError> {
        let remaining = ctx.remaining();
        if remaining.is_zero() {
            return Err(ctx.deadline_exceeded());
        }

        let response = self
            .client
            .post(format!("{}{}", self.url, path))
            .json(body)
            .timeout(remaining)
            .send()
            .await
            .map_err(|e| transport_error(ctx, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let value = response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                ctx.deadline_exceeded()
            } else {
                TransportError::Decode(e.to_string())
            }
        })?;

        debug!(path, "Backend answered");
        Ok(value)
    }
}

fn transport_error(ctx: &CallContext, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        ctx.deadline_exceeded()
    } else {
        TransportError::Connection(e.to_string())
    }
}

#[async_trait]
impl SigningBackend for HttpBackend {
    async fn keygen(
        &self,
        ctx: &CallContext,
        key_uid: &KeyUid,
        party_uid: &PartyUid,
    ) -> Result<Outcome<PublicKey>, TransportError> {
        let req = KeygenRequest {
            key_uid: key_uid.to_string(),
            party_uid: party_uid.to_string(),
        };

        let body = self.post(ctx, KEYGEN_PATH, &req).await?;
        Ok(classify_keygen(body))
    }

    async fn sign(
        &self,
        ctx: &CallContext,
        key_uid: &KeyUid,
        payload_hash: &PayloadHash,
        party_uid: &PartyUid,
        public_key: &PublicKey,
    ) -> Result<Outcome<Signature>, TransportError> {
        let req = SignRequest {
            key_uid: key_uid.to_string(),
            msg_to_sign: payload_hash.as_bytes().to_vec(),
            party_uid: party_uid.to_string(),
            pub_key: public_key.as_bytes().to_vec(),
        };

        let body = self.post(ctx, SIGN_PATH, &req).await?;
        Ok(classify_sign(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tss_coordinator::ParticipantId;

    #[test]
    fn test_url_is_normalized() {
        let backend = HttpBackend::new("http://127.0.0.1:50051/");
        assert_eq!(backend.url(), "http://127.0.0.1:50051");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_context_skips_request() {
        let backend = HttpBackend::new("http://127.0.0.1:1");
        let ctx = CallContext::with_timeout(Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;

        let err = backend
            .keygen(&ctx, &KeyUid::from("key1"), &PartyUid::from(&ParticipantId::new(vec![1])))
            .await
            .unwrap_err();

        assert_eq!(err, TransportError::DeadlineExceeded(Duration::from_millis(10)));
    }
}
