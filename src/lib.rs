//! Coordination of integral curve advection over domain-decomposed data.
//!
//! The [algorithm::IcAlgorithm] owns the curves of one process and moves them
//! between the active, inactive and terminated queues. Data loading and the
//! numerical integration are delegated to a [provider::DomainProvider]. All
//! cross-process interaction goes through a [comm::Collective].
#![cfg_attr(feature = "strict", deny(warnings), deny(unused_crate_dependencies))]
#![warn(missing_docs)]

pub mod algorithm;
pub mod comm;
pub mod config;
pub mod constants;
pub mod curve;
pub mod error;
pub mod geometry;
pub mod provider;
pub mod queues;
pub mod report;
pub mod scheduler;
pub mod sort;
pub mod statistics;
pub mod tools;
pub mod types;
pub mod uniform;

pub use error::{Error, Result};
