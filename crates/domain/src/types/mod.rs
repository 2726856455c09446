//! Data types exchanged with the API

pub mod envelope;
pub mod models;
pub mod parameter;
pub mod search;
pub mod token;

pub use envelope::{ApiError, Envelope, Metadata, Pagination};
pub use models::{
    Company, CurrentStatus, IntervalCode, PayPeriod, PayPeriodStatus, Worker, WorkerEmploymentType,
    WorkerName, WorkerStatusType, WorkerType,
};
pub use parameter::{BuildContext, Parameter, ParameterKind, ParameterValue};
pub use search::WorkerSearchCriteria;
pub use token::AuthToken;
