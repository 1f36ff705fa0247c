//! `ams-common` defines common types and algorithms used in the AMS ecosystem.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod role;

#[cfg(feature = "access_token")]
pub mod access_token;
