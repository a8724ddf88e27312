//! Wire types shared by the transport layer and the state holders.
//!
//! Response shapes are owned by the backend, so most payload structs default
//! every field and keep unknown keys rather than rejecting them. The only
//! strict shape is [`DebateTurn`]; the courtroom response is first decoded
//! leniently as [`CourtTurnPayload`] and validated afterwards.
//!
//! [`DashboardStats`] is display-only. A sub-structure of the wrong type
//! decodes as its default instead of failing the whole snapshot.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// CHAT
// =============================================================================

/// Author of a chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of the chat history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Body of a successful `POST /chat/`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

// =============================================================================
// COURTROOM
// =============================================================================

/// Party allowed to speak in a courtroom session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Policyholder,
    Insurer,
    Judge,
}

impl Speaker {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Policyholder => "Policyholder",
            Self::Insurer => "Insurer",
            Self::Judge => "Judge",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Speaker {
    type Err = MalformedTurn;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Policyholder" => Ok(Self::Policyholder),
            "Insurer" => Ok(Self::Insurer),
            "Judge" => Ok(Self::Judge),
            other => Err(MalformedTurn::UnknownSpeaker(other.to_owned())),
        }
    }
}

/// One argument made in a courtroom session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateTurn {
    pub speaker: Speaker,
    pub argument: String,
}

impl fmt::Display for DebateTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker, self.argument)
    }
}

/// Why a courtroom response could not become a [`DebateTurn`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTurn {
    #[error("response has no speaker")]
    MissingSpeaker,
    #[error("unknown speaker `{0}`")]
    UnknownSpeaker(String),
    #[error("response has no argument text")]
    MissingArgument,
    #[error("response body is not a turn object: {0}")]
    Undecodable(String),
}

/// Courtroom response as received, before validation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CourtTurnPayload {
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub argument: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CourtTurnPayload {
    /// Validate into a turn: the speaker must be known and the argument must
    /// contain non-whitespace text.
    ///
    /// # Errors
    ///
    /// Returns the first [`MalformedTurn`] reason found.
    pub fn into_turn(self) -> Result<DebateTurn, MalformedTurn> {
        let speaker = self
            .speaker
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(MalformedTurn::MissingSpeaker)?
            .parse::<Speaker>()?;
        let argument = self
            .argument
            .filter(|a| !a.trim().is_empty())
            .ok_or(MalformedTurn::MissingArgument)?;
        Ok(DebateTurn { speaker, argument })
    }
}

// =============================================================================
// ADMIN
// =============================================================================

/// Review state of an agent action request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
    /// Any status this client does not know. Never sent.
    #[serde(other)]
    Unknown,
}

impl RequestStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Denied => "DENIED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// An action an agent is waiting on an operator to approve or deny.
///
/// `id` is only present when the backend assigns one. Without it the request
/// can only be addressed by its position in the list it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_status")]
    pub status: RequestStatus,
}

fn default_status() -> RequestStatus {
    RequestStatus::Pending
}

/// Snapshot returned by `GET /admin/dashboard-stats`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DashboardStats {
    #[serde(default, deserialize_with = "or_default")]
    pub metrics: Metrics,
    /// Accepts a list of `{name, flags}` or a map keyed by company name.
    #[serde(default, deserialize_with = "company_list")]
    pub companies: Vec<CompanyFlags>,
    #[serde(default, deserialize_with = "percent_map")]
    pub issues_distribution: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub geo_risk: Vec<GeoRisk>,
    /// Set by the backend when it has no data to report (still a 2xx).
    #[serde(default, deserialize_with = "or_default")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Metrics {
    #[serde(default, deserialize_with = "count")]
    pub total_policies_analyzed: Option<u64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub top_risk_zip: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CompanyFlags {
    pub name: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub flags: u64,
    #[serde(default)]
    pub issues: Value,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GeoRisk {
    #[serde(deserialize_with = "string_or_number_required")]
    pub pincode: String,
    #[serde(default, deserialize_with = "or_default")]
    pub risk_score: f64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub reports: u64,
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Keeps the elements that decode and drops the rest.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(|item| T::deserialize(item).ok()).collect(),
        _ => Vec::new(),
    })
}

fn company_list<'de, D>(deserializer: D) -> Result<Vec<CompanyFlags>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| CompanyFlags::deserialize(item).ok())
            .collect(),
        Value::Object(by_name) => by_name
            .into_iter()
            .filter_map(|(name, info)| {
                let Value::Object(mut fields) = info else {
                    return None;
                };
                fields.entry("name").or_insert(Value::String(name));
                CompanyFlags::deserialize(Value::Object(fields)).ok()
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Label to percentage. Accepts numbers and strings such as `"40%"`.
fn percent_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(label, value)| {
            let percent = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
                _ => None,
            }?;
            Some((label, percent))
        })
        .collect())
}

fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(count_of))
}

fn count_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count(deserializer)?.unwrap_or(0))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn string_or_number_required<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    string_or_number(deserializer)?.ok_or_else(|| serde::de::Error::custom("expected string or number"))
}

/// Body of `PUT /admin/requests/{index}/status`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StatusAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /admin/trigger-agent`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TriggerAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

// =============================================================================
// AUDIT / MEDICAL / HEALTH
// =============================================================================

/// Body of `POST /audit/`. The report layout is backend-defined.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AuditResult {
    #[serde(default)]
    pub report: Map<String, Value>,
    #[serde(default)]
    pub critic_review: Option<Map<String, Value>>,
}

/// Body of `POST /audit/full-report`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FullReport {
    pub report_markdown: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MedicalAnalysis {
    pub analysis: Value,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TermExplanation {
    pub explanation: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub status: String,
}
