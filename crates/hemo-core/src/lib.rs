#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod corpus;
pub mod data_processor;
pub mod error;
pub mod logging;
pub mod report;
pub mod traits;
pub mod types;
