//! Integration flows.

pub mod http_flows;
pub mod store_contract;
