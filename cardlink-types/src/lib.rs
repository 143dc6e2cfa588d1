//! Type definitions for cardlink

pub mod chip;
pub mod error;
pub mod key;
pub mod service;

pub use chip::ChipType;
pub use error::{Error, Result};
pub use key::{AuthKey, KeyType};
pub use service::ServiceType;
