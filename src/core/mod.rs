pub mod batch;
pub mod business_time;
pub mod enrich;
pub mod etl;
pub mod ingest;
pub mod pipeline;
pub mod report;

pub use crate::domain::model::{Lead, LeadReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
