//! Cross-component integration flows

pub mod cold_start;
pub mod suggestion_flows;
