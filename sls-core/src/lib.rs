//! SLS Core
//!
//! Core types shared by the SLS log appender crates.
//!
//! This crate contains:
//! - Domain types: log events, payload values and flush-ready records
//! - DTOs: the request handed to a delivery client

pub mod domain;
pub mod dto;
