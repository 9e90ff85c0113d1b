//! ASUS Aura lighting SDK bindings.
//!
//! The vendor's `AURA_SDK.dll` is loaded at runtime and its exports are resolved by name, so
//! nothing links against the SDK at build time. See [`AuraSdk`] for the entry point.

pub mod color;
pub mod controller;
pub mod error;
pub mod facade;
pub mod ffi;

pub use crate::color::{ColorBuffer, Rgb};
pub use crate::controller::{Controller, Family, Handle, Mode, SdkLoader, VendorSdk};
pub use crate::error::AuraError;
pub use crate::facade::{AuraSdk, DiscoveryConfig, SdkConfig};
pub use crate::ffi::{DynamicLoader, FunctionTable, DEFAULT_LIBRARY};
