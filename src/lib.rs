pub mod dataset;
pub mod logger;
