//! Best-effort audit logging: plain-text dual-sink append.

pub mod audit;
