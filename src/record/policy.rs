//! Policy records

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::{RecordError, RecordResult};
use super::model::{flexible_date, require_text, RecordAttributes};
use super::query::FilterExpr;
use crate::schema::parse_date;

const POLICY_NUMBER_PREFIX: &str = "POL-";
const POLICY_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const POLICY_NUMBER_LEN: usize = 8;

/// Scalar attributes of an insurance policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub policy_number: String,
    pub policy_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "flexible_date")]
    pub policy_start_date: DateTime<Utc>,
    #[serde(with = "flexible_date")]
    pub policy_end_date: DateTime<Utc>,
    pub policy_status: String,
    pub policy_amount: f64,
    pub policy_term: u32,
}

/// Create input; `policyNumber` is generated when omitted
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyInput {
    #[serde(default)]
    pub policy_number: Option<String>,
    pub policy_type: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "flexible_date")]
    pub policy_start_date: DateTime<Utc>,
    #[serde(with = "flexible_date")]
    pub policy_end_date: DateTime<Utc>,
    pub policy_status: String,
    pub policy_amount: f64,
    pub policy_term: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPatch {
    pub policy_number: Option<String>,
    pub policy_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flexible_date::option::deserialize")]
    pub policy_start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_date::option::deserialize")]
    pub policy_end_date: Option<DateTime<Utc>>,
    pub policy_status: Option<String>,
    pub policy_amount: Option<f64>,
    pub policy_term: Option<u32>,
}

/// Generate a `POL-XXXXXXXX` number from an unambiguous alphabet
pub fn generate_policy_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..POLICY_NUMBER_LEN)
        .map(|_| POLICY_NUMBER_ALPHABET[rng.gen_range(0..POLICY_NUMBER_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", POLICY_NUMBER_PREFIX, suffix)
}

impl Policy {
    fn check(&self) -> RecordResult<()> {
        require_text("policyNumber", &self.policy_number)?;
        require_text("policyType", &self.policy_type)?;
        require_text("title", &self.title)?;
        require_text("policyStatus", &self.policy_status)?;
        if !self.policy_amount.is_finite() || self.policy_amount < 0.0 {
            return Err(RecordError::InvalidInput(
                "policyAmount must be a non-negative number".into(),
            ));
        }
        if self.policy_end_date < self.policy_start_date {
            return Err(RecordError::InvalidInput(
                "policyEndDate must not be before policyStartDate".into(),
            ));
        }
        Ok(())
    }
}

impl RecordAttributes for Policy {
    type Input = PolicyInput;
    type Patch = PolicyPatch;

    const COLLECTION: &'static str = "policies";
    const LABEL: &'static str = "Policy";
    const UNIQUE_FIELD: &'static str = "policyNumber";

    fn from_input(input: PolicyInput, _actor: &str) -> RecordResult<Self> {
        let policy = Policy {
            policy_number: input.policy_number.unwrap_or_else(generate_policy_number),
            policy_type: input.policy_type,
            title: input.title,
            description: input.description,
            policy_start_date: input.policy_start_date,
            policy_end_date: input.policy_end_date,
            policy_status: input.policy_status,
            policy_amount: input.policy_amount,
            policy_term: input.policy_term,
        };
        policy.check()?;
        Ok(policy)
    }

    fn apply_patch(&mut self, patch: PolicyPatch) -> RecordResult<()> {
        if let Some(v) = patch.policy_number {
            self.policy_number = v;
        }
        if let Some(v) = patch.policy_type {
            self.policy_type = v;
        }
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.description {
            self.description = Some(v);
        }
        if let Some(v) = patch.policy_start_date {
            self.policy_start_date = v;
        }
        if let Some(v) = patch.policy_end_date {
            self.policy_end_date = v;
        }
        if let Some(v) = patch.policy_status {
            self.policy_status = v;
        }
        if let Some(v) = patch.policy_amount {
            self.policy_amount = v;
        }
        if let Some(v) = patch.policy_term {
            self.policy_term = v;
        }
        self.check()
    }

    fn unique_key(&self) -> &str {
        &self.policy_number
    }

    fn filter(key: &str, value: &str) -> RecordResult<Option<FilterExpr>> {
        let filter = match key {
            "policyType" => FilterExpr::eq("policyType", json!(value)),
            "policyStatus" => FilterExpr::eq("policyStatus", json!(value)),
            "policyNumber" => FilterExpr::eq("policyNumber", json!(value)),
            "title" => FilterExpr::contains("title", value),
            "startDate" => FilterExpr::gte("policyStartDate", date_param(key, value)?),
            "endDate" => FilterExpr::lte("policyStartDate", date_param(key, value)?),
            _ => return Ok(None),
        };
        Ok(Some(filter))
    }
}

fn date_param(key: &str, value: &str) -> RecordResult<Value> {
    parse_date(value)
        .map(|dt| Value::String(dt.to_rfc3339()))
        .ok_or_else(|| RecordError::InvalidQuery(format!("{} must be a date, got '{}'", key, value)))
}
