//! RGB controller abstraction.

use std::ffi::c_void;
use std::fmt::{self, Display, Formatter};
use std::num::ParseIntError;
use std::path::Path;
use std::ptr;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::AuraError;

/// Controller family supported by the Aura SDK.
#[derive(ValueEnum, PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub enum Family {
    Motherboard,
    Gpu,
    Keyboard,
    Mouse,
}

impl Family {
    /// Whether multiple controllers of this family can exist.
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Motherboard | Self::Gpu)
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Motherboard => write!(f, "motherboard"),
            Self::Gpu => write!(f, "GPU"),
            Self::Keyboard => write!(f, "keyboard"),
            Self::Mouse => write!(f, "mouse"),
        }
    }
}

/// Address of a single controller.
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub enum Controller {
    Motherboard(usize),
    Gpu(usize),
    Keyboard,
    Mouse,
}

impl Controller {
    /// Build a controller address, the index is ignored for single-instance families.
    pub fn new(family: Family, index: usize) -> Self {
        match family {
            Family::Motherboard => Self::Motherboard(index),
            Family::Gpu => Self::Gpu(index),
            Family::Keyboard => Self::Keyboard,
            Family::Mouse => Self::Mouse,
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Self::Motherboard(_) => Family::Motherboard,
            Self::Gpu(_) => Family::Gpu,
            Self::Keyboard => Family::Keyboard,
            Self::Mouse => Family::Mouse,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Motherboard(index) | Self::Gpu(index) => Some(*index),
            Self::Keyboard | Self::Mouse => None,
        }
    }
}

impl Display for Controller {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => write!(f, "{} #{}", self.family(), index),
            None => write!(f, "{}", self.family()),
        }
    }
}

/// Opaque controller handle owned by the vendor SDK.
#[repr(transparent)]
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct Handle(*mut c_void);

impl Handle {
    pub const NULL: Self = Self(ptr::null_mut());

    pub const fn from_raw(raw: *mut c_void) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> *mut c_void {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::NULL
    }
}

/// Vendor lighting mode.
///
/// The value is passed to the SDK unmodified, only the two documented modes are named.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct Mode(pub u32);

impl Mode {
    /// Effects are run by the embedded controller.
    pub const FIRMWARE: Self = Self(0);

    /// Colors are driven by the host through `set_color`.
    pub const SOFTWARE: Self = Self(1);
}

impl From<u32> for Mode {
    fn from(mode: u32) -> Self {
        Self(mode)
    }
}

impl FromStr for Mode {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "firmware" => Ok(Self::FIRMWARE),
            "software" => Ok(Self::SOFTWARE),
            s => Ok(Mode(u32::from_str(s)?)),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bound vendor SDK entry points.
///
/// Every method maps onto one exported function of the loaded library for the given family.
pub trait VendorSdk {
    /// Enumerate motherboard or GPU controllers.
    ///
    /// Without a buffer only the number of available controllers is returned.
    fn enumerate(&self, family: Family, buffer: Option<&mut [Handle]>) -> Result<u32, AuraError>;

    /// Create the keyboard or mouse controller, `None` if the device is not present.
    fn create(&self, family: Family) -> Result<Option<Handle>, AuraError>;

    fn set_mode(&self, family: Family, handle: Handle, mode: Mode) -> Result<u32, AuraError>;

    fn set_color(&self, family: Family, handle: Handle, colors: &[u8]) -> Result<u32, AuraError>;

    fn get_color(&self, family: Family, handle: Handle, buffer: &mut [u8])
        -> Result<u32, AuraError>;

    fn led_count(&self, family: Family, handle: Handle) -> Result<u32, AuraError>;
}

/// Source of bound vendor SDKs.
pub trait SdkLoader {
    type Sdk: VendorSdk;

    /// Load the library at `path` and resolve its entry points.
    fn load(&self, path: &Path) -> Result<Self::Sdk, AuraError>;
}
