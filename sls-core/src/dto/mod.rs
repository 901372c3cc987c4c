//! Data Transfer Objects handed to delivery clients

pub mod put_logs;
