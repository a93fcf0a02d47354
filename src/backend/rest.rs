//! Hosted backend over HTTP.
//!
//! # Responsibilities
//! - Auth: password sign-in, sign-up, sign-out, current user
//! - Tables: filtered selects, inserts and updates with joined projections
//! - Storage: attachment upload, signed URLs, removal
//!
//! # Design Decisions
//! - Thin passthrough: no retries, no caching beyond the session
//! - Every request carries the anonymous key; the bearer token is the
//!   session's access token when signed in, the anonymous key otherwise
//! - Error bodies are reduced to their message field

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use crate::backend::model::*;
use crate::backend::{attachment_object_path, Backend, BackendError, BackendResult};
use crate::config::BackendConfig;
use crate::dom::SelectedFile;

const ASSET_JOINS: &str = "*,targets(name),actions(name)";
const ASSET_WITH_STRATEGY: &str = "*,targets(name),actions(name),strategies(id,title,owner_id)";
const ASSET_WITH_OWNED_STRATEGY: &str =
    "*,targets(name),actions(name),strategies!inner(id,title,owner_id)";

/// Client for a backend-as-a-service project.
pub struct RestBackend {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    bucket: String,
    signed_url_ttl: u64,
    session: ArcSwapOption<Session>,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let mut base = Url::parse(&config.url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base,
            anon_key: config.anon_key.clone(),
            bucket: config.storage_bucket.clone(),
            signed_url_ttl: config.signed_url_ttl_secs,
            session: ArcSwapOption::empty(),
        })
    }

    fn endpoint(&self, path: &str) -> BackendResult<Url> {
        Ok(self.base.join(path)?)
    }

    fn table_url(&self, table: &str, query: &[(&str, String)]) -> BackendResult<Url> {
        let mut url = self.endpoint(&format!("rest/v1/{}", table))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self
            .session
            .load()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone());

        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", token))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> BackendResult<Vec<T>> {
        let url = self.table_url(table, query)?;
        let response = self.request(Method::GET, url).send().await?;
        decode(response).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> BackendResult<Option<T>> {
        let mut query = query.to_vec();
        query.push(("limit", "1".to_string()));
        Ok(self.select(table, &query).await?.into_iter().next())
    }

    /// Insert or update, returning the written row.
    async fn write_row<T: DeserializeOwned>(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
        body: Value,
    ) -> BackendResult<T> {
        let url = self.table_url(table, query)?;
        let response = self
            .request(method, url)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let rows: Vec<T> = decode(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(table.to_string()))
    }

    async fn delete_rows(&self, table: &str, id: &str) -> BackendResult<()> {
        let url = self.table_url(table, &[("id", eq(id))])?;
        let response = self.request(Method::DELETE, url).send().await?;
        check(response).await.map(|_| ())
    }

    fn object_url(&self, path: &str) -> BackendResult<Url> {
        self.endpoint(&format!("storage/v1/object/{}/{}", self.bucket, path))
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

async fn check(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    tracing::debug!(status = status.as_u16(), message = %message, "Backend request rejected");

    if status.is_client_error() && status.as_u16() != 404 {
        Err(BackendError::Rejected(message))
    } else {
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let response = check(response).await?;
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Pull a human readable message out of an error body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl Backend for RestBackend {
    async fn session(&self) -> BackendResult<Option<Session>> {
        Ok(self.session.load_full().map(|s| (*s).clone()))
    }

    async fn current_user(&self) -> BackendResult<Option<User>> {
        if self.session.load().is_none() {
            return Ok(None);
        }
        let url = self.endpoint("auth/v1/user")?;
        let response = self.request(Method::GET, url).send().await?;
        match decode::<User>(response).await {
            Ok(user) => Ok(Some(user)),
            Err(BackendError::Rejected(message)) => {
                tracing::debug!(message = %message, "Session no longer valid");
                self.session.store(None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<User> {
        let url = self.endpoint("auth/v1/signup")?;
        let response = self
            .request(Method::POST, url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: Value = decode(response).await?;
        // Auto-confirming projects answer with a session, others with the user.
        let user = body.get("user").cloned().unwrap_or(body);
        serde_json::from_value(user).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let response = self
            .request(Method::POST, url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let session: Session = decode(response).await?;
        self.session.store(Some(Arc::new(session.clone())));
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        if self.session.load().is_none() {
            return Ok(());
        }
        let url = self.endpoint("auth/v1/logout")?;
        let result = self.request(Method::POST, url).send().await;
        self.session.store(None);
        check(result?).await.map(|_| ())
    }

    async fn is_admin(&self, user_id: &str) -> BackendResult<bool> {
        let rows: Vec<Value> = self
            .select(
                "admins",
                &[("select", "user_id".to_string()), ("user_id", eq(user_id))],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn user_strategies(&self, owner_id: &str) -> BackendResult<Vec<Strategy>> {
        self.select(
            "strategies",
            &[
                ("select", "*".to_string()),
                ("owner_id", eq(owner_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn strategy(&self, id: &str) -> BackendResult<Option<Strategy>> {
        self.select_one("strategies", &[("select", "*".to_string()), ("id", eq(id))])
            .await
    }

    async fn create_strategy(&self, strategy: NewStrategy) -> BackendResult<Strategy> {
        let body = serde_json::to_value(&strategy).map_err(|e| BackendError::Decode(e.to_string()))?;
        self.write_row(Method::POST, "strategies", &[], body).await
    }

    async fn update_strategy(&self, id: &str, update: StrategyUpdate) -> BackendResult<Strategy> {
        let body = json!({
            "title": update.title,
            "description": update.description,
            "updated_at": chrono::Utc::now(),
        });
        self.write_row(Method::PATCH, "strategies", &[("id", eq(id))], body)
            .await
    }

    async fn delete_strategy(&self, id: &str) -> BackendResult<()> {
        self.delete_rows("strategies", id).await
    }

    async fn assets_by_strategy(&self, strategy_id: &str) -> BackendResult<Vec<Asset>> {
        self.select(
            "assets",
            &[
                ("select", ASSET_JOINS.to_string()),
                ("strategy_id", eq(strategy_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn user_assets(&self, owner_id: &str) -> BackendResult<Vec<Asset>> {
        self.select(
            "assets",
            &[
                ("select", ASSET_WITH_OWNED_STRATEGY.to_string()),
                ("strategies.owner_id", eq(owner_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn asset(&self, id: &str) -> BackendResult<Option<Asset>> {
        self.select_one(
            "assets",
            &[("select", ASSET_WITH_STRATEGY.to_string()), ("id", eq(id))],
        )
        .await
    }

    async fn create_asset(&self, asset: NewAsset) -> BackendResult<Asset> {
        let body = serde_json::to_value(&asset).map_err(|e| BackendError::Decode(e.to_string()))?;
        self.write_row(
            Method::POST,
            "assets",
            &[("select", ASSET_JOINS.to_string())],
            body,
        )
        .await
    }

    async fn update_asset(&self, id: &str, update: AssetUpdate) -> BackendResult<Asset> {
        let body = serde_json::to_value(&update).map_err(|e| BackendError::Decode(e.to_string()))?;
        self.write_row(
            Method::PATCH,
            "assets",
            &[("id", eq(id)), ("select", ASSET_JOINS.to_string())],
            body,
        )
        .await
    }

    async fn delete_asset(&self, id: &str) -> BackendResult<()> {
        self.delete_rows("assets", id).await
    }

    async fn lookup(&self, table: LookupTable) -> BackendResult<Vec<LookupRecord>> {
        self.select(
            table.table_name(),
            &[
                ("select", "*".to_string()),
                ("order", "name.asc".to_string()),
            ],
        )
        .await
    }

    async fn attachments(&self, strategy_id: &str) -> BackendResult<Vec<Attachment>> {
        self.select(
            "strategy_attachments",
            &[
                ("select", "*".to_string()),
                ("strategy_id", eq(strategy_id)),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn upload_attachment(&self, strategy_id: &str, file: &SelectedFile) -> BackendResult<String> {
        let path = attachment_object_path(strategy_id, &file.name);
        let content_type = file
            .mime_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let response = self
            .request(Method::POST, self.object_url(&path)?)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(file.bytes.clone())
            .send()
            .await?;
        check(response).await?;

        tracing::debug!(path = %path, size = file.size(), "Attachment uploaded");
        Ok(path)
    }

    async fn create_attachment(&self, attachment: NewAttachment) -> BackendResult<Attachment> {
        let body =
            serde_json::to_value(&attachment).map_err(|e| BackendError::Decode(e.to_string()))?;
        self.write_row(Method::POST, "strategy_attachments", &[], body)
            .await
    }

    async fn attachment_signed_url(&self, path: &str) -> BackendResult<String> {
        let url = self.endpoint(&format!("storage/v1/object/sign/{}/{}", self.bucket, path))?;
        let response = self
            .request(Method::POST, url)
            .json(&json!({ "expiresIn": self.signed_url_ttl }))
            .send()
            .await?;
        let body: Value = decode(response).await?;
        let signed = body
            .get("signedURL")
            .or_else(|| body.get("signedUrl"))
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::Decode("signed URL missing from response".to_string()))?;
        Ok(self.endpoint(&format!("storage/v1/{}", signed.trim_start_matches('/')))?.to_string())
    }

    async fn remove_attachment_file(&self, path: &str) -> BackendResult<()> {
        let url = self.endpoint(&format!("storage/v1/object/{}", self.bucket))?;
        let response = self
            .request(Method::DELETE, url)
            .json(&json!({ "prefixes": [path] }))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    async fn delete_attachment(&self, id: &str) -> BackendResult<()> {
        self.delete_rows("strategy_attachments", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> BackendConfig {
        BackendConfig {
            url: url.to_string(),
            anon_key: "anon".to_string(),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let backend = RestBackend::new(&config("https://project.example.co/base")).unwrap();
        assert_eq!(
            backend.endpoint("auth/v1/user").unwrap().as_str(),
            "https://project.example.co/base/auth/v1/user"
        );
    }

    #[test]
    fn test_table_url_encodes_filters() {
        let backend = RestBackend::new(&config("https://project.example.co")).unwrap();
        let url = backend
            .table_url("assets", &[("select", ASSET_JOINS.to_string()), ("id", eq("7"))])
            .unwrap();
        assert_eq!(url.path(), "/rest/v1/assets");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("select".to_string(), ASSET_JOINS.to_string()));
        assert_eq!(pairs[1], ("id".to_string(), "eq.7".to_string()));
    }

    #[test]
    fn test_object_url_uses_bucket() {
        let backend = RestBackend::new(&config("https://project.example.co")).unwrap();
        assert_eq!(
            backend.object_url("1/abc-file.pdf").unwrap().path(),
            "/storage/v1/object/strategy-attachments/1/abc-file.pdf"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message(r#"{"message":"duplicate key"}"#), "duplicate key");
        assert_eq!(error_message("plain failure\n"), "plain failure");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(matches!(
            RestBackend::new(&config("not a url")),
            Err(BackendError::InvalidUrl(_))
        ));
    }
}
