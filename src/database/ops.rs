//! REST operations on a database reference.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DatabaseRef, QueryOption};
use crate::error::{check_server_error, FirebaseResult};
use crate::push_id::generate_push_id;
use crate::traits::{Method, Response};

/// Location of the security rules, relative to the database root.
pub const RULES_PATH: &str = "/.settings/rules";

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl DatabaseRef {
    async fn send(
        &self,
        method: Method,
        body: Option<Bytes>,
        options: &[QueryOption],
    ) -> FirebaseResult<Response> {
        let url = self.request_url(options);
        let mut headers = self.headers().await?;
        if body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }

        debug!(%method, %url, "Sending database request");
        let response = self.http().execute(method, &url, body, &headers).await?;
        check_server_error(response)
    }

    /// Read the value at this location.
    pub async fn get<T: DeserializeOwned>(&self, options: &[QueryOption]) -> FirebaseResult<T> {
        let response = self.send(Method::Get, None, options).await?;
        Ok(response.json()?)
    }

    /// Read the value at this location as raw JSON.
    pub async fn get_raw(&self, options: &[QueryOption]) -> FirebaseResult<Bytes> {
        Ok(self.send(Method::Get, None, options).await?.body)
    }

    /// Replace the value at this location.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        value: &T,
        options: &[QueryOption],
    ) -> FirebaseResult<()> {
        self.set_raw(Bytes::from(serde_json::to_vec(value)?), options)
            .await
    }

    /// Replace the value at this location with already encoded JSON.
    pub async fn set_raw(&self, json: Bytes, options: &[QueryOption]) -> FirebaseResult<()> {
        self.send(Method::Put, Some(json), options).await?;
        Ok(())
    }

    /// Append a child with a server-generated key and return the key.
    pub async fn push<T: Serialize + ?Sized>(
        &self,
        value: &T,
        options: &[QueryOption],
    ) -> FirebaseResult<String> {
        let body = Bytes::from(serde_json::to_vec(value)?);
        let response = self.send(Method::Post, Some(body), options).await?;
        let pushed: PushResponse = response.json()?;
        Ok(pushed.name)
    }

    /// Append a child under a locally generated push id and return the id.
    ///
    /// Unlike [`push`](Self::push) the key is known before the write lands.
    pub async fn push_local<T: Serialize + ?Sized>(
        &self,
        value: &T,
        options: &[QueryOption],
    ) -> FirebaseResult<String> {
        let key = generate_push_id();
        self.child(&key).set(value, options).await?;
        Ok(key)
    }

    /// Merge the given children into the value at this location.
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        value: &T,
        options: &[QueryOption],
    ) -> FirebaseResult<()> {
        let body = Bytes::from(serde_json::to_vec(value)?);
        self.send(Method::Patch, Some(body), options).await?;
        Ok(())
    }

    /// Delete the value at this location.
    pub async fn remove(&self, options: &[QueryOption]) -> FirebaseResult<()> {
        self.send(Method::Delete, None, options).await?;
        Ok(())
    }

    /// Reference to the security rules.
    pub fn rules(&self) -> DatabaseRef {
        self.child(RULES_PATH)
    }

    /// Fetch the security rules as JSON.
    pub async fn get_rules_json(&self) -> FirebaseResult<Bytes> {
        self.rules().get_raw(&[]).await
    }

    /// Replace the security rules.
    pub async fn set_rules<T: Serialize + ?Sized>(&self, rules: &T) -> FirebaseResult<()> {
        self.rules().set(rules, &[]).await
    }

    /// Replace the security rules with a JSON document.
    ///
    /// The document is checked and pretty-printed before upload, so invalid
    /// JSON fails locally.
    pub async fn set_rules_json(&self, json: &[u8]) -> FirebaseResult<()> {
        let rules: serde_json::Value = serde_json::from_slice(json)?;
        let pretty = serde_json::to_vec_pretty(&rules)?;
        self.rules().set_raw(Bytes::from(pretty), &[]).await
    }
}
