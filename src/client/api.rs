//! Lead API Client
//!
//! Typed wrappers over [`ApiClient::authed_fetch`] for the endpoints the
//! dashboards use. Each call turns a non-success status into
//! `ClientError::Http` with the backend's `detail` or a fixed message.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::http::{decode_json, expect_success, RequestOptions};
use crate::client::pipeline::ApiClient;
use crate::shared::error::ClientError;
use crate::shared::leads::{BillingStatus, DashboardMetrics, Lead, LeadCreate, ReportKind};

impl ApiClient {
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let response = self.authed_fetch(path, RequestOptions::get()).await?;
        let response = expect_success(response, fallback).await?;
        decode_json(response).await
    }

    async fn post_json<B, T>(
        &self,
        path: &str,
        payload: &B,
        fallback: &str,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let options = RequestOptions::post().json(payload)?;
        let response = self.authed_fetch(path, options).await?;
        let response = expect_success(response, fallback).await?;
        decode_json(response).await
    }

    pub async fn fetch_leads(&self) -> Result<Vec<Lead>, ClientError> {
        self.get_json("/api/v1/leads", "Failed to load leads").await
    }

    pub async fn create_lead(&self, payload: &LeadCreate) -> Result<Lead, ClientError> {
        self.post_json("/api/v1/leads", payload, "Failed to create lead")
            .await
    }

    pub async fn fetch_dashboard(&self) -> Result<DashboardMetrics, ClientError> {
        self.get_json("/api/v1/analytics/dashboard", "Failed to load dashboard")
            .await
    }

    pub async fn fetch_integrations(&self) -> Result<Vec<Value>, ClientError> {
        self.get_json("/api/v1/integrations/channels", "Failed to load integrations")
            .await
    }

    pub async fn save_integration(&self, payload: &Value) -> Result<Value, ClientError> {
        self.post_json(
            "/api/v1/integrations/channels",
            payload,
            "Failed to save integration",
        )
        .await
    }

    pub async fn fetch_appointment_suggestions(&self) -> Result<Value, ClientError> {
        self.get_json("/api/v1/appointments/suggestions", "Failed to load suggestions")
            .await
    }

    pub async fn create_appointment(&self, payload: &Value) -> Result<Value, ClientError> {
        self.post_json("/api/v1/appointments", payload, "Failed to create appointment")
            .await
    }

    /// Download a report file as raw bytes
    pub async fn download_report(&self, kind: ReportKind) -> Result<Bytes, ClientError> {
        let path = format!("/api/v1/reports/{}", kind.endpoint());
        let fallback = format!("Failed to download {} report", kind.label());
        let response = self.authed_fetch(&path, RequestOptions::get()).await?;
        let response = expect_success(response, &fallback).await?;
        Ok(response.bytes().await?)
    }

    pub async fn create_scheduled_report(&self, payload: &Value) -> Result<Value, ClientError> {
        self.post_json(
            "/api/v1/reports/scheduled",
            payload,
            "Failed to create scheduled report",
        )
        .await
    }

    pub async fn list_scheduled_reports(&self) -> Result<Vec<Value>, ClientError> {
        self.get_json("/api/v1/reports/scheduled", "Failed to list scheduled reports")
            .await
    }

    pub async fn send_scheduled_report_now(&self, report_id: i64) -> Result<Value, ClientError> {
        let path = format!("/api/v1/reports/scheduled/{}/send-now", report_id);
        let response = self.authed_fetch(&path, RequestOptions::post()).await?;
        let response = expect_success(response, "Failed to queue scheduled report").await?;
        decode_json(response).await
    }

    pub async fn billing_status(&self) -> Result<BillingStatus, ClientError> {
        self.get_json("/api/v1/billing/status", "Failed to load billing status")
            .await
    }
}
