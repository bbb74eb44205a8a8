//! Unit tests for configuration loading and precedence.
//!
//! Tests are organised into modules by functional area:
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `field_resolution`: Defaults and credential resolution tests
//! - `git_settings`: Filling unset fields from `pr.*` git settings

mod helpers;
