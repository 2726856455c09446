//! Resource models decoded from envelope content
//!
//! Only the fields the client works with are modelled. Anything else the
//! server sends is dropped by the lenient decode pass.

use chrono::{DateTime, Utc};
use payx_common::tolerant::nullable;
use payx_common::tolerant_enum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub company_id: String,
    #[serde(default)]
    pub display_id: Option<String>,
    #[serde(default)]
    pub legal_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub worker_id: String,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub worker_type: Option<WorkerType>,
    #[serde(default, deserialize_with = "nullable")]
    pub employment_type: Option<WorkerEmploymentType>,
    #[serde(default)]
    pub work_state: Option<String>,
    #[serde(default)]
    pub hire_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<WorkerName>,
    #[serde(default)]
    pub current_status: Option<CurrentStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerName {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub preferred_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStatus {
    #[serde(default)]
    pub worker_status_id: Option<String>,
    pub status_type: WorkerStatusType,
    #[serde(default)]
    pub effective_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPeriod {
    pub pay_period_id: String,
    pub interval_code: IntervalCode,
    pub status: PayPeriodStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submit_by_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_count: u32,
}

tolerant_enum! {
    /// Pay period frequency.
    pub enum IntervalCode (fallback = None) {
        None => "NONE",
        Annual => "ANNUAL",
        BiWeekly => "BI_WEEKLY",
        Monthly => "MONTHLY",
        Quarterly => "QUARTERLY",
        SemiAnnual => "SEMI_ANNUAL",
        SemiMonthly => "SEMI_MONTHLY",
        Weekly => "WEEKLY",
    }
}

tolerant_enum! {
    pub enum PayPeriodStatus (fallback = Completed) {
        Completed => "COMPLETED",
        CompletedByMec => "COMPLETED_BY_MEC",
        Entry => "ENTRY",
        Initial => "INITIAL",
        Processing => "PROCESSING",
        Reissued => "REISSUED",
        Released => "RELEASED",
        Reversed => "REVERSED",
    }
}

tolerant_enum! {
    pub enum WorkerStatusType (fallback = Active) {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Terminated => "TERMINATED",
        Transferred => "TRANSFERRED",
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
    }
}

tolerant_enum! {
    pub enum WorkerType (fallback = Employee) {
        Employee => "EMPLOYEE",
        IndependentContractor => "INDEPENDENT_CONTRACTOR",
    }
}

tolerant_enum! {
    pub enum WorkerEmploymentType (fallback = FullTime) {
        FullTime => "FULL_TIME",
        PartTime => "PART_TIME",
    }
}
