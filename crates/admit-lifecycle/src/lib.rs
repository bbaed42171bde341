//! Application lifecycle for the admissions core.
//!
//! This crate owns the application status field:
//!
//! - `machine` - actions, the transition table and the single permission check
//! - `payment` - the payment window opened on acceptance
//! - `service` - operations that read, authorize, transition and write
//! - `error` - lifecycle errors with user-facing notifications
//!
//! # Example
//!
//! ```ignore
//! use admit_lifecycle::ApplicationService;
//! use admit_model::{Actor, ApplicationStatus};
//!
//! let service = ApplicationService::new(gateway, objects, config);
//! let update = service
//!     .update_application_status(&Actor::official("uni-1"), &app_id, ApplicationStatus::Accepted)
//!     .await?;
//! // Competing applications are withdrawn in the background.
//! drop(update.cleanup);
//! ```

mod error;
mod machine;
mod payment;
mod service;

pub use error::{LifecycleError, Result};
pub use machine::{AccessTarget, Action, authorize, next_status, progress};
pub use payment::{
    DEFAULT_PAYMENT_WINDOW_DAYS, PAYMENT_STATUS_PENDING, PaymentWindow, compute_payment_window,
};
pub use service::{ApplicationService, StatusUpdate};
