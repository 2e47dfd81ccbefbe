//! duffel: the device-transfer core.
//!
//! Packages a user's entire account state (profile, relational rows, and the
//! categorized file tree) into a portable snapshot on an external volume, and
//! reconstitutes that state, including a brand-new login, on another host.
//!
//! The external API layer talks to [`service::TransferService`]: start an
//! export or import (accepted immediately, runs on a background task), poll
//! the progress snapshot until a terminal phase, or probe a volume with
//! `detect`.

pub mod account;
pub mod categories;
pub mod common;
pub mod export;
pub mod import;
pub mod package;
pub mod service;
pub mod store;

pub use common::errors::TransferError;
pub use common::progress::{TransferPhase, TransferProgress};
pub use service::TransferService;
