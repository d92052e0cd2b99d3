//! Checks for PL/SQL routines and declarations.

pub mod in_nvarchar2_usage;

pub use in_nvarchar2_usage::{InNvarchar2UsageDetector, ParameterMode};
