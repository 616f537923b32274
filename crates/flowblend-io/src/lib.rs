//! # flowblend-io: Case Files and Plan Reports
//!
//! Reads planning cases from JSON or TOML and writes solved plans as flat CSV
//! tables plus a JSON summary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowblend_algo::Planner;
//! use flowblend_io::{load_network, write_report};
//! use std::path::Path;
//!
//! let network = load_network("demos/small_blending.toml")?;
//! let plan = Planner::default().plan(&network)?;
//! write_report(&plan.report(), Path::new("out"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Files
//!
//! | Direction | File | Columns |
//! |-----------|------|---------|
//! | in | `*.json`, `*.toml` | `options`, `sets`, `parameters` |
//! | in | plan config `*.toml` | `[flow]`, `[quality]`, `[plan]` |
//! | out | `transfers.csv` | origin, mode, destination, period, value |
//! | out | `production.csv`, `demand.csv`, `storage.csv`, `composition.csv` | location, period, value |
//! | out | `summary.json` | objective, cost totals, statuses, timings, violations |

pub mod case;
pub mod config;
pub mod error;
pub mod format;
pub mod report;

pub use case::{load_network, read_case, CaseFile, CaseOptions, CaseParameters, CaseSets};
pub use config::read_plan_config;
pub use error::{CaseError, CaseResult};
pub use format::CaseFormat;
pub use report::{write_csv, write_report};
