//! Dynamically loaded Aura SDK entry points.
//!
//! All functions are exported by `AURA_SDK.dll` using the Windows `WINAPI` calling convention
//! with `DWORD` arguments and return values.

use std::path::Path;
use std::ptr;

use libloading::{Library, Symbol};
use tracing::{debug, info, warn};

use crate::controller::{Family, Handle, Mode, SdkLoader, VendorSdk};
use crate::error::AuraError;

/// Well-known file name of the vendor library.
pub const DEFAULT_LIBRARY: &str = "AURA_SDK.dll";

type EnumerateFn = unsafe extern "system" fn(*mut Handle, u32) -> u32;
type CreateFn = unsafe extern "system" fn(*mut Handle) -> u32;
type SetModeFn = unsafe extern "system" fn(Handle, u32) -> u32;
type ColorFn = unsafe extern "system" fn(Handle, *mut u8, u32) -> u32;
type LedCountFn = unsafe extern "system" fn(Handle) -> u32;

/// Optionally resolved library export.
#[derive(Copy, Clone)]
struct Entry<F> {
    symbol: &'static str,
    function: Option<F>,
}

impl<F: Copy> Entry<F> {
    /// Look up `symbol` in the library.
    ///
    /// # Safety
    ///
    /// `F` must match the signature of the exported function.
    unsafe fn resolve(library: &Library, symbol: &'static str) -> Self {
        let lookup: Result<Symbol<'_, F>, _> = unsafe { library.get(symbol.as_bytes()) };
        let function = match lookup {
            Ok(function) => Some(*function),
            Err(err) => {
                warn!(symbol, %err, "Aura SDK entry point missing");
                None
            },
        };

        Self { symbol, function }
    }

    fn get(&self) -> Result<F, AuraError> {
        self.function.ok_or(AuraError::Unsupported { symbol: self.symbol })
    }

    fn is_resolved(&self) -> bool {
        self.function.is_some()
    }
}

/// Entry points resolved from a loaded Aura SDK library.
pub struct FunctionTable {
    enumerate_mb_controller: Entry<EnumerateFn>,
    set_mb_mode: Entry<SetModeFn>,
    set_mb_color: Entry<ColorFn>,
    get_mb_color: Entry<ColorFn>,
    get_mb_led_count: Entry<LedCountFn>,

    enumerate_gpu: Entry<EnumerateFn>,
    set_gpu_mode: Entry<SetModeFn>,
    set_gpu_color: Entry<ColorFn>,
    get_gpu_led_count: Entry<LedCountFn>,

    create_claymore_keyboard: Entry<CreateFn>,
    set_claymore_keyboard_mode: Entry<SetModeFn>,
    set_claymore_keyboard_color: Entry<ColorFn>,
    get_claymore_keyboard_led_count: Entry<LedCountFn>,

    create_rog_mouse: Entry<CreateFn>,
    set_rog_mouse_mode: Entry<SetModeFn>,
    set_rog_mouse_color: Entry<ColorFn>,
    rog_mouse_led_count: Entry<LedCountFn>,

    // Function pointers above are only valid while the library is loaded.
    _library: Library,
}

impl FunctionTable {
    /// Load the library at `path` and resolve all known entry points.
    ///
    /// Missing entry points do not fail the load, calling them returns
    /// [`AuraError::Unsupported`] instead.
    pub fn open(path: &Path) -> Result<Self, AuraError> {
        // Loading runs the library's initialization routines, which is the point of this crate.
        let library = unsafe { Library::new(path) }.map_err(|err| AuraError::LoadFailure {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        // SAFETY: Signatures follow the vendor's `AURALightingSDK.h`.
        let table = unsafe {
            Self {
                enumerate_mb_controller: Entry::resolve(&library, "EnumerateMbController"),
                set_mb_mode: Entry::resolve(&library, "SetMbMode"),
                set_mb_color: Entry::resolve(&library, "SetMbColor"),
                get_mb_color: Entry::resolve(&library, "GetMbColor"),
                get_mb_led_count: Entry::resolve(&library, "GetMbLedCount"),

                enumerate_gpu: Entry::resolve(&library, "EnumerateGPU"),
                set_gpu_mode: Entry::resolve(&library, "SetGPUMode"),
                set_gpu_color: Entry::resolve(&library, "SetGPUColor"),
                get_gpu_led_count: Entry::resolve(&library, "GetGPULedCount"),

                create_claymore_keyboard: Entry::resolve(&library, "CreateClaymoreKeyboard"),
                set_claymore_keyboard_mode: Entry::resolve(&library, "SetClaymoreKeyboardMode"),
                set_claymore_keyboard_color: Entry::resolve(&library, "SetClaymoreKeyboardColor"),
                get_claymore_keyboard_led_count: Entry::resolve(
                    &library,
                    "GetClaymoreKeyboardLedCount",
                ),

                create_rog_mouse: Entry::resolve(&library, "CreateRogMouse"),
                set_rog_mouse_mode: Entry::resolve(&library, "SetRogMouseMode"),
                set_rog_mouse_color: Entry::resolve(&library, "SetRogMouseColor"),
                rog_mouse_led_count: Entry::resolve(&library, "RogMouseLedCount"),

                _library: library,
            }
        };

        info!(
            path = %path.display(),
            resolved = table.resolved_count(),
            total = ENTRY_COUNT,
            "Aura SDK loaded"
        );

        Ok(table)
    }

    /// Number of entry points exported by the loaded library.
    pub fn resolved_count(&self) -> usize {
        [
            self.enumerate_mb_controller.is_resolved(),
            self.set_mb_mode.is_resolved(),
            self.set_mb_color.is_resolved(),
            self.get_mb_color.is_resolved(),
            self.get_mb_led_count.is_resolved(),
            self.enumerate_gpu.is_resolved(),
            self.set_gpu_mode.is_resolved(),
            self.set_gpu_color.is_resolved(),
            self.get_gpu_led_count.is_resolved(),
            self.create_claymore_keyboard.is_resolved(),
            self.set_claymore_keyboard_mode.is_resolved(),
            self.set_claymore_keyboard_color.is_resolved(),
            self.get_claymore_keyboard_led_count.is_resolved(),
            self.create_rog_mouse.is_resolved(),
            self.set_rog_mouse_mode.is_resolved(),
            self.set_rog_mouse_color.is_resolved(),
            self.rog_mouse_led_count.is_resolved(),
        ]
        .iter()
        .filter(|resolved| **resolved)
        .count()
    }

    fn set_mode_entry(&self, family: Family) -> Entry<SetModeFn> {
        match family {
            Family::Motherboard => self.set_mb_mode,
            Family::Gpu => self.set_gpu_mode,
            Family::Keyboard => self.set_claymore_keyboard_mode,
            Family::Mouse => self.set_rog_mouse_mode,
        }
    }

    fn set_color_entry(&self, family: Family) -> Entry<ColorFn> {
        match family {
            Family::Motherboard => self.set_mb_color,
            Family::Gpu => self.set_gpu_color,
            Family::Keyboard => self.set_claymore_keyboard_color,
            Family::Mouse => self.set_rog_mouse_color,
        }
    }

    fn led_count_entry(&self, family: Family) -> Entry<LedCountFn> {
        match family {
            Family::Motherboard => self.get_mb_led_count,
            Family::Gpu => self.get_gpu_led_count,
            Family::Keyboard => self.get_claymore_keyboard_led_count,
            Family::Mouse => self.rog_mouse_led_count,
        }
    }
}

/// Number of entry points in [`FunctionTable`].
const ENTRY_COUNT: usize = 17;

impl VendorSdk for FunctionTable {
    fn enumerate(&self, family: Family, buffer: Option<&mut [Handle]>) -> Result<u32, AuraError> {
        let enumerate = match family {
            Family::Motherboard => self.enumerate_mb_controller.get()?,
            Family::Gpu => self.enumerate_gpu.get()?,
            family => return Err(not_applicable(family, "enumeration")),
        };

        let count = match buffer {
            Some(buffer) => {
                let capacity = sdk_len(buffer.len())?;
                unsafe { enumerate(buffer.as_mut_ptr(), capacity) }
            },
            None => unsafe { enumerate(ptr::null_mut(), 0) },
        };

        debug!(%family, count, "Enumerated Aura controllers");

        Ok(count)
    }

    fn create(&self, family: Family) -> Result<Option<Handle>, AuraError> {
        let create = match family {
            Family::Keyboard => self.create_claymore_keyboard.get()?,
            Family::Mouse => self.create_rog_mouse.get()?,
            family => return Err(not_applicable(family, "single controller creation")),
        };

        let mut handle = Handle::NULL;
        let status = unsafe { create(&mut handle) };

        debug!(%family, status, "Created Aura controller");

        Ok((status > 0).then_some(handle))
    }

    fn set_mode(&self, family: Family, handle: Handle, mode: Mode) -> Result<u32, AuraError> {
        let set_mode = self.set_mode_entry(family).get()?;
        Ok(unsafe { set_mode(handle, mode.0) })
    }

    fn set_color(&self, family: Family, handle: Handle, colors: &[u8]) -> Result<u32, AuraError> {
        let set_color = self.set_color_entry(family).get()?;
        let len = sdk_len(colors.len())?;

        // The SDK takes a mutable pointer, never hand it the caller's buffer.
        let mut colors = colors.to_vec();

        Ok(unsafe { set_color(handle, colors.as_mut_ptr(), len) })
    }

    fn get_color(
        &self,
        family: Family,
        handle: Handle,
        buffer: &mut [u8],
    ) -> Result<u32, AuraError> {
        let get_color = match family {
            Family::Motherboard => self.get_mb_color.get()?,
            family => return Err(not_applicable(family, "reading colors")),
        };
        let len = sdk_len(buffer.len())?;

        Ok(unsafe { get_color(handle, buffer.as_mut_ptr(), len) })
    }

    fn led_count(&self, family: Family, handle: Handle) -> Result<u32, AuraError> {
        let led_count = self.led_count_entry(family).get()?;
        Ok(unsafe { led_count(handle) })
    }
}

/// Loader for the vendor library on disk.
#[derive(Default, Debug, Copy, Clone)]
pub struct DynamicLoader;

impl SdkLoader for DynamicLoader {
    type Sdk = FunctionTable;

    fn load(&self, path: &Path) -> Result<FunctionTable, AuraError> {
        FunctionTable::open(path)
    }
}

/// Convert a buffer length to the SDK's `DWORD`.
fn sdk_len(len: usize) -> Result<u32, AuraError> {
    u32::try_from(len).map_err(|_| AuraError::BufferTooLarge { len })
}

fn not_applicable(family: Family, operation: &'static str) -> AuraError {
    AuraError::NotApplicable { family, operation }
}
