//! Estimate (quotation) models and customer decision payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EstimateItem {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub total_amount: f64,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EstimateLineItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EstimateDetail {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub created_at: String,
    pub valid_until: Option<String>,
    pub company_name: Option<String>,
    #[serde(default)]
    pub items: Vec<EstimateLineItem>,
    pub subtotal: f64,
    pub discount: f64,
    #[serde(default)]
    pub discount_description: String,
    pub tax: f64,
    pub total: f64,
    pub notes: Option<String>,
}

/// Request body for `POST /estimates/{id}/reject`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

/// Request body for `POST /estimates/{id}/revision`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RevisionRequest {
    #[serde(default)]
    pub requester_name: String,
    pub title: String,
    pub content: String,
}

/// Outcome of approve/reject/revision actions.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ActionResult {
    #[serde(default)]
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}
