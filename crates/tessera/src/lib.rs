//! # Tessera
//!
//! The scan-to-check-in core of a loyalty-program kiosk: a camera session
//! made ready for scanning, and a strictly ordered pipeline that turns each
//! decoded QR code into exactly one check-in.
//!
//! ## Core Concepts
//!
//! Tessera separates **the camera** from **the submission**:
//! - [`CameraManager`] = session state (which device is active, whether it
//!   is scanning)
//! - [`CheckInPipeline`] = submission sequencing (what one decode becomes)
//!
//! The key principle: **One Decode = One Attempt = One Check-in**. The camera
//! is fully stopped before the first network call, and the reward lookup
//! completes before the check-in record is written.
//!
//! ## Architecture
//!
//! ```text
//! Scanner widget (external)
//!     │
//!     ▼ on_decode
//! ScanController loop (one decode at a time)
//!     │
//!     ├─► 1. CameraManager.stop()          ── failure: abort, stay stopped
//!     │
//!     ├─► 2. Backend.reward_due(code)      ── failure: notice, delay,
//!     │                                       restart scanning ─────────┐
//!     ├─► 3. Backend.check_in(code)        ── failure: same policy ─────┤
//!     │                                                                 │
//!     └─► 4. NoticeBus.emit(..)                                         │
//!            Router.navigate_to(CustomerList)                           │
//!                                                                       │
//!            CameraManager.restart() ◄────────────────────────────────────┘
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Lookup before submission** - eligibility is evaluated against the
//!    customer's state before the access record exists
//! 2. **Camera stopped before network** - a spurious second decode cannot
//!    fire mid-submission
//! 3. **Stop is idempotent** - stopping a session that is not scanning is a
//!    no-op, never an error
//! 4. **The resolved device id is persisted** - both on auto-selection and
//!    on user change, never a stale reference
//! 5. **Stale runs are ignored** - teardown bumps the session generation;
//!    a pipeline that finishes afterwards discards its result
//! 6. **No silent failures** - every failure path ends in a user-visible
//!    notice or a resumed scanning state
//!
//! ## Guarantees
//!
//! - **At-most-once delivery**: notices are broadcast in memory; slow
//!   receivers may miss them
//! - **No replay**: lagged notice receivers get errors, not history
//! - **Strict sequencing**: within one decode-triggered run, each step is
//!   awaited before the next; no two network calls are ever in flight for
//!   the same decode
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tessera_core::{CameraManager, NoticeBus, ScanController};
//!
//! let notices = NoticeBus::new();
//! let camera = Arc::new(CameraManager::new(loader, store, notices.clone(), "reader"));
//!
//! let controller = ScanController::new(
//!     camera.clone(),
//!     backend,
//!     notices.clone(),
//!     router,
//!     Duration::from_millis(1000),
//! );
//!
//! // Entering the scan view: load the library, pick a camera, start decoding.
//! controller.enter().await?;
//!
//! // Drive decodes until a check-in succeeds and navigation leaves the view.
//! controller.run().await;
//! ```
//!
//! ## What This Is Not
//!
//! Tessera is **not**:
//! - A scanner driver (the widget lives behind [`Scanner`])
//! - An HTTP client (the backend lives behind [`Backend`])
//! - A router or a templating layer
//!
//! Tessera **is**:
//! > The coordination layer that makes exactly one camera ready, and turns
//! > each decode into exactly one correctly ordered check-in.

// Core modules
mod backend;
mod bus;
mod config;
mod controller;
mod core;
mod error;
mod pipeline;
mod router;
mod scanner;
mod session;
mod store;


// Pipeline and controller tests (test-only)
#[cfg(test)]
mod pipeline_tests;

// Re-export core types
pub use crate::core::{AttemptOutcome, CheckInAttempt, ScanStatus};

// Re-export backend boundary types
pub use backend::{Backend, CheckInRequest, CheckInResponse, CustomerInfo, RewardDueResponse};

// Re-export error types
pub use error::{ApiError, CameraError, PipelineError};

// Re-export scanner boundary types
pub use scanner::{CameraDevice, DecodeHandler, Scanner, ScannerLoader, ScannerModule};

// Re-export persistence boundary types
pub use store::{KeyValueStore, SELECTED_CAMERA_KEY, SELECTION_EXPIRY_DAYS};

// Re-export notice types
pub use bus::{Notice, NoticeBus, Severity};

// Re-export router types
pub use router::{Router, View};

// Re-export configuration
pub use config::KioskConfig;

// Re-export session types
pub use session::CameraManager;

// Re-export pipeline types
pub use pipeline::{CheckInPipeline, Disposition};

// Re-export controller types (primary entry point)
pub use controller::ScanController;

// Re-export commonly used external types
pub use async_trait::async_trait;
