//! Lead, dashboard and report payloads.
//!
//! Only the fields the client reads are typed; the rest of the dashboard and
//! integration payloads pass through as JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A lead as listed by `GET /api/v1/leads`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub channel: String,
    pub status: String,
    pub score: f64,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub assigned_agent_id: Option<i64>,
    pub created_at: String,
}

/// Body of `POST /api/v1/leads`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadCreate {
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub channel: String,
    pub raw_message: String,
}

/// Headline metrics of `GET /api/v1/analytics/dashboard`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    #[serde(default)]
    pub total_leads: Option<f64>,
    #[serde(default)]
    pub avg_response_time: Option<f64>,
    #[serde(default)]
    pub conversion_rate: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Subscription state of `GET /api/v1/billing/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingStatus {
    pub status: String,
    pub plan: String,
    #[serde(default)]
    pub has_customer: bool,
}

/// Downloadable report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Csv,
    Pdf,
}

impl ReportKind {
    /// Endpoint name under `/api/v1/reports/`
    pub fn endpoint(self) -> &'static str {
        match self {
            ReportKind::Csv => "leads.csv",
            ReportKind::Pdf => "analytics.pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Csv => "CSV",
            ReportKind::Pdf => "PDF",
        }
    }
}
