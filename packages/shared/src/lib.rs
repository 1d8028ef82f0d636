//! Utilities shared by the StudySync packages.

pub mod logger;
pub mod time;
