//! Launch plan configuration.
//!
//! - Schema definitions in [`schema`]
//! - Loading, environment overrides, and validation in [`loader`]
//! - `${var}` interpolation for command templates in [`interpolation`]
//!
//! # Example
//!
//! ```
//! use launchpad::config::{load_plan, LaunchKind};
//! use std::fs;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("launch.yml");
//! fs::write(
//!     &path,
//!     r#"
//! kind: token
//! token: { name: Acme, symbol: ACME, chain: "137", supply: "1000" }
//! commands:
//!   deploy_contract: "echo 0xabc"
//!   set_claim_conditions: "true"
//!   mint: "true"
//! "#,
//! )
//! .unwrap();
//!
//! let plan = load_plan(&path).unwrap();
//! assert_eq!(plan.kind, LaunchKind::Token);
//! ```

pub mod interpolation;
pub mod loader;
pub mod schema;

pub use interpolation::{
    extract_variables, parse_interpolation, resolve_string, InterpolationContext, Segment,
};
pub use loader::{
    apply_batch_size_override, load_plan, parse_plan, validate_plan, BATCH_SIZE_ENV,
};
pub use schema::{CommandSet, LaunchKind, LaunchPlan, PlanSettings};
