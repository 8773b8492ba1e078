pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod orchestration;

pub use config::Config;
pub use datasource::{DataSource, DataSourceError, HttpDataSource, MockDataSource};
pub use db::{init_db, Repository};
pub use domain::{
    DepositSnapshot, DepositStatus, EventId, FundingOutcome, FundingRequest, Percentage, Satoshi,
    SystemParameters, ValidationError,
};
pub use engine::{classify, Clock, CountdownTimer, ManualClock, Quote, SystemClock};
pub use error::AppError;
pub use monitor::{DepositMonitor, MonitorHandle, MonitorSettings, MonitorView};
pub use orchestration::{FundingError, FundingService, ParameterCache};
