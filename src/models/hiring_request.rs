use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::decode_text;
use crate::workflow::RequestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "MOI")]
    Moi,
    #[serde(rename = "MOS")]
    Mos,
    #[serde(rename = "MOD")]
    Mod,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Moi => "MOI",
            Category::Mos => "MOS",
            Category::Mod => "MOD",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MOI" => Ok(Category::Moi),
            "MOS" => Ok(Category::Mos),
            "MOD" => Ok(Category::Mod),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    #[serde(rename = "CDI")]
    Cdi,
    #[serde(rename = "CDD")]
    Cdd,
    #[serde(rename = "CIVP")]
    Civp,
    Stage,
    Alternance,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Cdi => "CDI",
            ContractType::Cdd => "CDD",
            ContractType::Civp => "CIVP",
            ContractType::Stage => "Stage",
            ContractType::Alternance => "Alternance",
        }
    }
}

impl FromStr for ContractType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CDI" => Ok(ContractType::Cdi),
            "CDD" => Ok(ContractType::Cdd),
            "CIVP" => Ok(ContractType::Civp),
            "Stage" => Ok(ContractType::Stage),
            "Alternance" => Ok(ContractType::Alternance),
            other => Err(format!("unknown contract type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Priority::Low),
            "Medium" => Ok(Priority::Medium),
            "High" => Ok(Priority::High),
            "Critical" => Ok(Priority::Critical),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiringRequest {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub department_id: Uuid,
    pub category: Category,
    pub status: RequestStatus,
    pub requester_id: Uuid,
    pub approver_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub contract_type: ContractType,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, PgRow> for HiringRequest {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            requirements: row.try_get("requirements")?,
            department_id: row.try_get("department_id")?,
            category: decode_text(row, "category")?,
            status: decode_text(row, "status")?,
            requester_id: row.try_get("requester_id")?,
            approver_id: row.try_get("approver_id")?,
            rejection_reason: row.try_get("rejection_reason")?,
            contract_type: decode_text(row, "contract_type")?,
            priority: decode_text(row, "priority")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            approved_at: row.try_get("approved_at")?,
        })
    }
}

/// Fields accepted at intake. Workflow fields are filled in by the store.
#[derive(Debug, Clone)]
pub struct NewHiringRequest {
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub department_id: Uuid,
    pub category: Category,
    pub requester_id: Uuid,
    pub contract_type: ContractType,
    pub priority: Priority,
}

/// Descriptive edit. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct HiringRequestChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub department_id: Option<Uuid>,
    pub category: Option<Category>,
    pub contract_type: Option<ContractType>,
    pub priority: Option<Priority>,
}

impl HiringRequestChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.requirements.is_none()
            && self.department_id.is_none()
            && self.category.is_none()
            && self.contract_type.is_none()
            && self.priority.is_none()
    }

    pub fn apply_to(&self, request: &mut HiringRequest) {
        if let Some(title) = &self.title {
            request.title = title.clone();
        }
        if let Some(description) = &self.description {
            request.description = Some(description.clone());
        }
        if let Some(requirements) = &self.requirements {
            request.requirements = Some(requirements.clone());
        }
        if let Some(department_id) = self.department_id {
            request.department_id = department_id;
        }
        if let Some(category) = self.category {
            request.category = category;
        }
        if let Some(contract_type) = self.contract_type {
            request.contract_type = contract_type;
        }
        if let Some(priority) = self.priority {
            request.priority = priority;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HiringRequestFilter {
    pub status: Option<RequestStatus>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub department_id: Option<Uuid>,
    pub requester_id: Option<Uuid>,
    pub search: Option<String>,
}

impl HiringRequestFilter {
    pub fn matches(&self, request: &HiringRequest) -> bool {
        self.status.map_or(true, |s| request.status == s)
            && self.category.map_or(true, |c| request.category == c)
            && self.priority.map_or(true, |p| request.priority == p)
            && self.department_id.map_or(true, |d| request.department_id == d)
            && self.requester_id.map_or(true, |r| request.requester_id == r)
            && self.search.as_deref().map_or(true, |needle| {
                request
                    .title
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            })
    }
}

pub struct HiringRequestList {
    pub items: Vec<HiringRequest>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HiringRequestStats {
    pub total: i64,
    pub by_status: std::collections::BTreeMap<String, i64>,
    pub by_category: std::collections::BTreeMap<String, i64>,
    pub by_priority: std::collections::BTreeMap<String, i64>,
}
