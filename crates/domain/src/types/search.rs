//! Worker search criteria for the company workers listing

use chrono::{DateTime, Utc};

use crate::constants::{ACCEPT_HEADER, COMPANY_ID, WORKERS_COMMUNICATIONS_MEDIA};
use crate::types::envelope::Pagination;
use crate::types::parameter::Parameter;
use crate::utils::to_json_date;

const GIVEN_NAME: &str = "givenName";
const FAMILY_NAME: &str = "familyName";
const LEGAL_LAST_FOUR: &str = "legalLastFour";
const EMPLOYEE_ID: &str = "employeeId";
const FROM_DATE: &str = "from";
const TO_DATE: &str = "to";

/// Filters for `GET /companies/{companyId}/workers`.
///
/// The API accepts one search style per call. An employee id wins over
/// names, and names win over a hire-date range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSearchCriteria {
    pub company_id: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub legal_last_four: Option<String>,
    pub employee_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub paging: Pagination,
}

impl WorkerSearchCriteria {
    pub fn for_company(company_id: impl Into<String>) -> Self {
        Self { company_id: company_id.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_paging(mut self, paging: Pagination) -> Self {
        self.paging = paging;
        self
    }

    /// Parameters for the request, in the order they are applied.
    #[must_use]
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut params = vec![
            Parameter::path(COMPANY_ID, self.company_id.clone()),
            Parameter::header(ACCEPT_HEADER, WORKERS_COMMUNICATIONS_MEDIA),
        ];
        params.extend(self.paging.page_parameters());

        if let Some(employee_id) = non_empty(self.employee_id.as_ref()) {
            params.push(Parameter::query(EMPLOYEE_ID, employee_id));
            return params;
        }

        let names = [
            (GIVEN_NAME, &self.given_name),
            (FAMILY_NAME, &self.family_name),
            (LEGAL_LAST_FOUR, &self.legal_last_four),
        ];
        let before = params.len();
        for (name, value) in names {
            if let Some(value) = non_empty(value.as_ref()) {
                params.push(Parameter::query(name, value));
            }
        }
        if params.len() > before {
            return params;
        }

        if let Some(from) = self.from {
            params.push(Parameter::query(FROM_DATE, to_json_date(from)));
        }
        if let Some(to) = self.to {
            params.push(Parameter::query(TO_DATE, to_json_date(to)));
        }
        params
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}
