//! Supabase adapter for the remote ports: PostgREST for rows, GoTrue for auth.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::resume::{NewResumeRow, ResumeRow, ResumeTemplateRow, ResumeUpdate};
use crate::models::user::Profile;
use crate::remote::{Remote, RemoteConnector, RemoteError, ResumeRemote};

pub mod auth;
pub mod rest;

use auth::GoTrueClient;
use rest::PostgrestClient;

const RESUMES: &str = "resumes";
const TEMPLATES: &str = "resume_templates";
const PROFILES: &str = "profiles";

/// The caller's bearer token, shared between the REST and auth halves so a
/// sign-in is picked up by subsequent row requests.
pub type AccessToken = Arc<RwLock<Option<String>>>;

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL without trailing slash, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub anon_key: String,
    /// Postgres schema exposed through PostgREST.
    pub schema: String,
}

/// Row access through PostgREST.
pub struct SupabaseRows {
    rest: PostgrestClient,
}

#[async_trait]
impl ResumeRemote for SupabaseRows {
    async fn list_resumes(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, RemoteError> {
        self.rest
            .table(RESUMES)
            .select("*")
            .eq("user_id", user_id)
            .order("updated_at", false)
            .fetch()
            .await
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRow>, RemoteError> {
        let rows: Vec<ResumeRow> = self
            .rest
            .table(RESUMES)
            .select("*")
            .eq("id", id)
            .limit(1)
            .fetch()
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_resume(&self, row: &NewResumeRow) -> Result<Option<ResumeRow>, RemoteError> {
        let rows: Vec<ResumeRow> = self.rest.table(RESUMES).select("*").insert(row).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_resume(
        &self,
        id: Uuid,
        update: &ResumeUpdate,
    ) -> Result<Option<ResumeRow>, RemoteError> {
        let rows: Vec<ResumeRow> = self
            .rest
            .table(RESUMES)
            .select("*")
            .eq("id", id)
            .update(update)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_resume(&self, id: Uuid) -> Result<(), RemoteError> {
        self.rest.table(RESUMES).eq("id", id).delete().await
    }

    async fn list_templates(&self) -> Result<Vec<ResumeTemplateRow>, RemoteError> {
        self.rest
            .table(TEMPLATES)
            .select("*")
            .order("order", true)
            .fetch()
            .await
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, RemoteError> {
        let rows: Vec<Profile> = self
            .rest
            .table(PROFILES)
            .select("*")
            .eq("id", user_id)
            .limit(1)
            .fetch()
            .await?;
        Ok(rows.into_iter().next())
    }
}

/// Hands out per-caller `Remote`s sharing one HTTP connection pool.
#[derive(Clone)]
pub struct SupabaseConnector {
    http: Client,
    config: SupabaseConfig,
}

impl SupabaseConnector {
    pub fn new(config: SupabaseConfig, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, config })
    }
}

impl RemoteConnector for SupabaseConnector {
    fn connect(&self, access_token: Option<&str>) -> Remote {
        debug!(
            "Connecting to Supabase ({}authenticated)",
            if access_token.is_some() { "" } else { "un" }
        );
        let token: AccessToken = Arc::new(RwLock::new(access_token.map(str::to_string)));
        let rest = PostgrestClient::new(self.http.clone(), self.config.clone(), token.clone());
        let auth = GoTrueClient::new(self.http.clone(), self.config.clone(), token);
        Remote {
            data: Arc::new(SupabaseRows { rest }),
            auth: Arc::new(auth),
        }
    }
}
