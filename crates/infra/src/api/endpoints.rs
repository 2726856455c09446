//! Resource methods
//!
//! Each method only assembles a resource path and parameters; everything
//! else happens in [`ApiClient::call`].

use chrono::{DateTime, Utc};
use payx_domain::constants::{
    ACCEPT_HEADER, COMPANY_ID, DISPLAY_ID, PAY_PERIOD_ID, WORKER_COMMUNICATIONS_MEDIA, WORKER_ID,
};
use payx_domain::{
    to_json_date, Company, Envelope, Parameter, ParameterKind, PayPeriod, PayPeriodStatus, Result, Worker,
    WorkerSearchCriteria,
};
use reqwest::Method;

use super::client::ApiClient;

const STATUS_PARAM: &str = "status";
const FROM_PARAM: &str = "from";
const TO_PARAM: &str = "to";

impl ApiClient {
    /// Companies the credentials have access to.
    pub async fn companies(&self) -> Result<Envelope<Company>> {
        self.call("companies", Method::GET, &[]).await
    }

    pub async fn company(&self, company_id: &str) -> Result<Envelope<Company>> {
        self.call("companies/{companyId}", Method::GET, &[Parameter::path(COMPANY_ID, company_id)]).await
    }

    /// Look a company up by the id shown to clients.
    ///
    /// A blank id returns an empty envelope without a request.
    pub async fn company_by_display_id(&self, display_id: &str) -> Result<Envelope<Company>> {
        if display_id.trim().is_empty() {
            return Ok(Envelope::default());
        }
        self.call("companies", Method::GET, &[Parameter::query(DISPLAY_ID, display_id)]).await
    }

    /// Workers of a company, optionally filtered.
    ///
    /// `company_id` takes precedence over the id held by `criteria`.
    pub async fn company_workers(
        &self,
        company_id: &str,
        criteria: Option<&WorkerSearchCriteria>,
    ) -> Result<Envelope<Worker>> {
        let mut params = vec![Parameter::path(COMPANY_ID, company_id)];
        if let Some(criteria) = criteria {
            params.extend(criteria.parameters());
        }
        self.call("companies/{companyId}/workers", Method::GET, &params).await
    }

    /// One worker, including communications.
    pub async fn worker(&self, worker_id: &str) -> Result<Envelope<Worker>> {
        let params = [
            Parameter::path(WORKER_ID, worker_id),
            Parameter::header(ACCEPT_HEADER, WORKER_COMMUNICATIONS_MEDIA),
        ];
        self.call("workers/{workerId}", Method::GET, &params).await
    }

    /// Pay periods of a company.
    ///
    /// The date range is only sent when both ends are given.
    pub async fn pay_periods(
        &self,
        company_id: &str,
        status: Option<PayPeriodStatus>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Envelope<PayPeriod>> {
        let range = from.zip(to);
        let params = [
            Parameter::path(COMPANY_ID, company_id),
            Parameter::when(STATUS_PARAM, ParameterKind::Query, status.is_some(), move |_| {
                status.map(|s| s.to_string()).unwrap_or_default()
            }),
            Parameter::when(FROM_PARAM, ParameterKind::Query, range.is_some(), move |_| {
                range.map(|(from, _)| to_json_date(from)).unwrap_or_default()
            }),
            Parameter::when(TO_PARAM, ParameterKind::Query, range.is_some(), move |_| {
                range.map(|(_, to)| to_json_date(to)).unwrap_or_default()
            }),
        ];
        self.call("companies/{companyId}/payperiods", Method::GET, &params).await
    }

    pub async fn pay_period(&self, company_id: &str, pay_period_id: &str) -> Result<Envelope<PayPeriod>> {
        let params = [Parameter::path(COMPANY_ID, company_id), Parameter::path(PAY_PERIOD_ID, pay_period_id)];
        self.call("companies/{companyId}/payperiods/{payperiodid}", Method::GET, &params).await
    }
}
