//! # portfolio-stats
//!
//! Engagement statistics core for a portfolio platform: real-time
//! lifetime counters plus rolling-window ("recent") counters that a
//! daily batch job recomputes from an append-only event log.
//!
//! The host application calls [`service::StatsService`] synchronously on
//! each user action (view, like, unlike, comment, uncomment, share).
//! That path is optimistic and best-effort. [`service::RollupJob`] runs
//! out-of-band — daily at 02:00 via [`scheduler`], or on demand for one
//! portfolio — and overwrites the rolling counters with authoritative
//! counts from the event log, absorbing any drift.
//!
//! ## Architecture
//!
//! ```text
//! Host application (per user action)        Scheduler (daily 02:00)
//!     │                                         │
//!     ├── StatsService (service/)               ├── RollupJob (service/)
//!     │     append event + atomic delta         │     recount window, overwrite
//!     │                                         │
//!     └──────────── StatStore / EventStore (store/) ────────────┘
//!                         │
//!                   PostgreSQL (or in-memory for tests)
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod scheduler;
pub mod service;
pub mod store;
