//! Minimal Supabase client
//!
//! Covers the two surfaces the app needs: PostgREST table reads under the
//! user's row level security, and edge function invocation.

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone)]
struct Session {
    access_token: String,
    user_id: Uuid,
}

/// Supabase client bound to an optional user session
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    config: ClientConfig,
    http: Client,
    session: Option<Session>,
}

impl SupabaseClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: Client::new(),
            session: None,
        }
    }

    pub fn with_session(mut self, access_token: impl Into<String>, user_id: Uuid) -> Self {
        self.set_session(access_token, user_id);
        self
    }

    pub fn set_session(&mut self, access_token: impl Into<String>, user_id: Uuid) {
        self.session = Some(Session {
            access_token: access_token.into(),
            user_id,
        });
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.user_id)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    fn ensure_configured(&self) -> ClientResult<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ClientError::NotConfigured)
        }
    }

    /// Attach the project key and the user's token, or the anon key without a session
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or(self.config.anon_key.as_str());
        request
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    /// `SELECT *` from `table`, filtered by column equality
    pub async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> ClientResult<Vec<T>> {
        self.ensure_configured()?;

        let url = format!("{}/rest/v1/{}", self.config.supabase_url, table);
        let mut query: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        query.extend(
            filters
                .iter()
                .map(|(column, value)| (column.to_string(), format!("eq.{}", value))),
        );

        let response = self
            .authorize(self.http.get(&url))
            .query(&query)
            .send()
            .await?;

        let body = read_success(response, || format!("Query on {} failed", table)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Like [`select_rows`](Self::select_rows) but for at most one row
    pub async fn select_maybe_single<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> ClientResult<Option<T>> {
        let mut rows: Vec<T> = self.select_rows(table, filters).await?;
        if rows.len() > 1 {
            return Err(ClientError::MultipleRows);
        }
        Ok(rows.pop())
    }

    /// POST a JSON body to `/functions/v1/{name}` with the user's token
    pub async fn invoke_function<B, R>(&self, name: &str, body: &B) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call_function(name, body, None).await
    }

    /// [`invoke_function`](Self::invoke_function) with a custom message for
    /// failures that carry no `error` field
    pub(crate) async fn call_function<B, R>(
        &self,
        name: &str,
        body: &B,
        fallback: Option<&str>,
    ) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.ensure_configured()?;
        let token = self.access_token().ok_or(ClientError::NotAuthenticated)?;

        let url = format!("{}/functions/v1/{}", self.config.supabase_url, name);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", token))
            .json(body)
            .send()
            .await?;

        let body = read_success(response, || {
            fallback
                .map(String::from)
                .unwrap_or_else(|| format!("Failed to call {}", name))
        })
        .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Body of a 2xx response, or an `Api` error carrying the server's message
async fn read_success(response: Response, fallback: impl FnOnce() -> String) -> ClientResult<String> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(body);
    }

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(fallback);

    tracing::debug!(status = %status, message = %message, "Supabase request failed");

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
