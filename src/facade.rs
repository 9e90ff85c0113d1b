//! Aura SDK controller facade.
//!
//! [`AuraSdk`] owns the loaded vendor library together with every controller discovered while
//! loading it. Controllers are enumerated exactly once per load, hot-plugged devices are only
//! picked up by unloading and loading the SDK again.
//!
//! The facade holds raw vendor handles and is therefore neither `Send` nor `Sync`. The vendor
//! SDK makes no thread-safety guarantees, so all calls must happen on the thread which loaded
//! it.

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::controller::{Controller, Family, Handle, Mode, SdkLoader, VendorSdk};
use crate::error::AuraError;
use crate::ffi::{DynamicLoader, DEFAULT_LIBRARY};

/// Controller families discovered while loading the SDK.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct DiscoveryConfig {
    pub motherboard: bool,
    pub gpu: bool,
    pub keyboard: bool,
    pub mouse: bool,
}

impl DiscoveryConfig {
    pub fn is_enabled(&self, family: Family) -> bool {
        match family {
            Family::Motherboard => self.motherboard,
            Family::Gpu => self.gpu,
            Family::Keyboard => self.keyboard,
            Family::Mouse => self.mouse,
        }
    }

    pub fn set_enabled(&mut self, family: Family, enabled: bool) {
        match family {
            Family::Motherboard => self.motherboard = enabled,
            Family::Gpu => self.gpu = enabled,
            Family::Keyboard => self.keyboard = enabled,
            Family::Mouse => self.mouse = enabled,
        }
    }

    /// Skip discovery for `family`.
    pub fn disable(mut self, family: Family) -> Self {
        self.set_enabled(family, false);
        self
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { motherboard: true, gpu: true, keyboard: true, mouse: true }
    }
}

/// Aura SDK configuration.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SdkConfig {
    /// Vendor library, resolved through the platform's library search path if relative.
    pub library_path: PathBuf,
    pub discovery: DiscoveryConfig,
}

impl SdkConfig {
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = path.into();
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self { library_path: PathBuf::from(DEFAULT_LIBRARY), discovery: Default::default() }
    }
}

/// State of one loaded SDK.
struct Session<S> {
    motherboards: Vec<Handle>,
    gpus: Vec<Handle>,
    keyboard: Option<Handle>,
    mouse: Option<Handle>,

    // Dropped last, handles are only meaningful while the library is loaded.
    sdk: S,
}

impl<S: VendorSdk> Session<S> {
    fn discover(sdk: S, config: &DiscoveryConfig) -> Self {
        let single = |family| {
            if config.is_enabled(family) {
                discover_single(&sdk, family)
            } else {
                None
            }
        };
        let indexed = |family| {
            if config.is_enabled(family) {
                discover_indexed(&sdk, family)
            } else {
                Vec::new()
            }
        };

        let keyboard = single(Family::Keyboard);
        let motherboards = indexed(Family::Motherboard);
        let gpus = indexed(Family::Gpu);
        let mouse = single(Family::Mouse);

        Self { motherboards, gpus, keyboard, mouse, sdk }
    }

    /// Look up the vendor handle of a controller.
    fn handle(&self, controller: Controller) -> Option<Handle> {
        match controller {
            Controller::Motherboard(index) => self.motherboards.get(index).copied(),
            Controller::Gpu(index) => self.gpus.get(index).copied(),
            Controller::Keyboard => self.keyboard,
            Controller::Mouse => self.mouse,
        }
    }
}

/// Upper bound for controllers of one family reported by the SDK.
pub const MAX_CONTROLLERS: u32 = 64;

/// Enumerate all motherboard or GPU controllers, logging failures.
fn discover_indexed<S: VendorSdk>(sdk: &S, family: Family) -> Vec<Handle> {
    match enumerate(sdk, family) {
        Ok(handles) => handles,
        Err(err) => {
            warn!(%family, %err, "Aura controller discovery failed");
            Vec::new()
        },
    }
}

/// Two-phase enumeration, first querying the count and then filling the handle array.
fn enumerate<S: VendorSdk>(sdk: &S, family: Family) -> Result<Vec<Handle>, AuraError> {
    let discovery_error = |err: AuraError| AuraError::Discovery { family, reason: err.to_string() };

    let mut count = sdk.enumerate(family, None).map_err(discovery_error)?;
    if count > MAX_CONTROLLERS {
        warn!(%family, count, max = MAX_CONTROLLERS, "Aura SDK reported too many controllers");
        count = MAX_CONTROLLERS;
    }

    let mut handles = vec![Handle::NULL; count as usize];
    if handles.is_empty() {
        return Ok(handles);
    }

    let filled = sdk.enumerate(family, Some(&mut handles)).map_err(discovery_error)?;
    handles.truncate(filled as usize);

    Ok(handles)
}

/// Create the keyboard or mouse controller, logging failures.
fn discover_single<S: VendorSdk>(sdk: &S, family: Family) -> Option<Handle> {
    match sdk.create(family) {
        Ok(Some(handle)) => Some(handle),
        Ok(None) => {
            debug!(%family, "No Aura controller present");
            None
        },
        Err(err) => {
            let err = AuraError::Discovery { family, reason: err.to_string() };
            warn!(%family, %err, "Aura controller discovery failed");
            None
        },
    }
}

/// ASUS Aura lighting SDK.
///
/// ```no_run
/// use aurasdk::{AuraSdk, Mode, Rgb, ColorBuffer};
///
/// let mut sdk = AuraSdk::new();
/// sdk.load()?;
///
/// for index in 0..sdk.motherboard_count() {
///     let led_count = sdk.motherboard_led_count(index)? as usize;
///     sdk.set_motherboard_mode(index, Mode::SOFTWARE)?;
///     sdk.set_motherboard_color(index, &ColorBuffer::filled(led_count, Rgb::new(0xff, 0, 0)))?;
/// }
/// # Ok::<(), aurasdk::AuraError>(())
/// ```
pub struct AuraSdk<L: SdkLoader = DynamicLoader> {
    loader: L,
    config: SdkConfig,
    session: Option<Session<L::Sdk>>,
}

impl AuraSdk {
    /// Create an unloaded SDK using the default library path.
    pub fn new() -> Self {
        Self::with_config(SdkConfig::default())
    }

    pub fn with_config(config: SdkConfig) -> Self {
        Self::with_loader(DynamicLoader, config)
    }
}

impl Default for AuraSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: SdkLoader> AuraSdk<L> {
    pub fn with_loader(loader: L, config: SdkConfig) -> Self {
        Self { loader, config, session: None }
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Load the vendor library and discover all controllers.
    ///
    /// Only a failure to load the library itself is returned, controller families which could
    /// not be enumerated are logged and reported as absent. Loading an already loaded SDK
    /// reloads it from scratch.
    pub fn load(&mut self) -> Result<(), AuraError> {
        self.unload();

        let sdk = match self.loader.load(&self.config.library_path) {
            Ok(sdk) => sdk,
            Err(err) => {
                error!(%err, "Unable to load Aura SDK");
                return Err(err);
            },
        };

        let session = Session::discover(sdk, &self.config.discovery);

        info!(
            motherboards = session.motherboards.len(),
            gpus = session.gpus.len(),
            keyboard = session.keyboard.is_some(),
            mouse = session.mouse.is_some(),
            "Aura controller discovery complete"
        );

        self.session = Some(session);

        Ok(())
    }

    /// Release the vendor library.
    ///
    /// Unloading an SDK which is not loaded has no effect.
    pub fn unload(&mut self) {
        if self.session.take().is_some() {
            info!("Aura SDK unloaded");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_keyboard_present(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.keyboard.is_some())
    }

    pub fn is_mouse_present(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.mouse.is_some())
    }

    pub fn motherboard_count(&self) -> usize {
        self.session.as_ref().map_or(0, |session| session.motherboards.len())
    }

    pub fn gpu_count(&self) -> usize {
        self.session.as_ref().map_or(0, |session| session.gpus.len())
    }

    /// All discovered controllers, ordered motherboards, GPUs, keyboard, mouse.
    pub fn controllers(&self) -> Vec<Controller> {
        let mut controllers: Vec<_> =
            (0..self.motherboard_count()).map(Controller::Motherboard).collect();
        controllers.extend((0..self.gpu_count()).map(Controller::Gpu));

        if self.is_keyboard_present() {
            controllers.push(Controller::Keyboard);
        }
        if self.is_mouse_present() {
            controllers.push(Controller::Mouse);
        }

        controllers
    }

    /// Set the lighting mode of a controller.
    pub fn set_mode(&self, controller: Controller, mode: Mode) -> Result<(), AuraError> {
        let (sdk, handle) = self.resolve(controller)?;

        match sdk.set_mode(controller.family(), handle, mode) {
            Ok(status) => {
                debug!(%controller, %mode, status, "Set Aura lighting mode");
                Ok(())
            },
            Err(err) => {
                warn!(%controller, %mode, %err, "Unable to set Aura lighting mode");
                Err(err)
            },
        }
    }

    /// Upload a color buffer to a controller.
    ///
    /// The buffer is passed to the SDK unmodified, its length is not checked against the
    /// controller's LED count.
    pub fn set_color(&self, controller: Controller, colors: &[u8]) -> Result<(), AuraError> {
        let (sdk, handle) = self.resolve(controller)?;

        if colors.is_empty() {
            return Err(AuraError::EmptyColorBuffer);
        } else if u32::try_from(colors.len()).is_err() {
            return Err(AuraError::BufferTooLarge { len: colors.len() });
        }

        match sdk.set_color(controller.family(), handle, colors) {
            Ok(status) => {
                debug!(%controller, len = colors.len(), status, "Updated Aura colors");
                Ok(())
            },
            Err(err) => {
                warn!(%controller, %err, "Unable to update Aura colors");
                Err(err)
            },
        }
    }

    /// Number of LEDs of a controller.
    ///
    /// A controller without LEDs reports `Ok(0)`, unknown controllers are an error.
    pub fn led_count(&self, controller: Controller) -> Result<u32, AuraError> {
        let (sdk, handle) = self.resolve(controller)?;

        sdk.led_count(controller.family(), handle).map_err(|err| {
            warn!(%controller, %err, "Unable to get Aura LED count");
            err
        })
    }

    /// Read the current colors of a motherboard controller into `buffer`.
    ///
    /// Returns the status reported by the SDK.
    pub fn motherboard_color(&self, index: usize, buffer: &mut [u8]) -> Result<u32, AuraError> {
        let controller = Controller::Motherboard(index);
        let (sdk, handle) = self.resolve(controller)?;

        sdk.get_color(Family::Motherboard, handle, buffer).map_err(|err| {
            warn!(%controller, %err, "Unable to read Aura colors");
            err
        })
    }

    pub fn set_motherboard_mode(&self, index: usize, mode: Mode) -> Result<(), AuraError> {
        self.set_mode(Controller::Motherboard(index), mode)
    }

    pub fn set_motherboard_color(&self, index: usize, colors: &[u8]) -> Result<(), AuraError> {
        self.set_color(Controller::Motherboard(index), colors)
    }

    pub fn motherboard_led_count(&self, index: usize) -> Result<u32, AuraError> {
        self.led_count(Controller::Motherboard(index))
    }

    pub fn set_gpu_mode(&self, index: usize, mode: Mode) -> Result<(), AuraError> {
        self.set_mode(Controller::Gpu(index), mode)
    }

    pub fn set_gpu_color(&self, index: usize, colors: &[u8]) -> Result<(), AuraError> {
        self.set_color(Controller::Gpu(index), colors)
    }

    pub fn gpu_led_count(&self, index: usize) -> Result<u32, AuraError> {
        self.led_count(Controller::Gpu(index))
    }

    pub fn set_keyboard_mode(&self, mode: Mode) -> Result<(), AuraError> {
        self.set_mode(Controller::Keyboard, mode)
    }

    pub fn set_keyboard_color(&self, colors: &[u8]) -> Result<(), AuraError> {
        self.set_color(Controller::Keyboard, colors)
    }

    pub fn keyboard_led_count(&self) -> Result<u32, AuraError> {
        self.led_count(Controller::Keyboard)
    }

    pub fn set_mouse_mode(&self, mode: Mode) -> Result<(), AuraError> {
        self.set_mode(Controller::Mouse, mode)
    }

    pub fn set_mouse_color(&self, colors: &[u8]) -> Result<(), AuraError> {
        self.set_color(Controller::Mouse, colors)
    }

    pub fn mouse_led_count(&self) -> Result<u32, AuraError> {
        self.led_count(Controller::Mouse)
    }

    /// Get the bound SDK and vendor handle for a controller.
    fn resolve(&self, controller: Controller) -> Result<(&L::Sdk, Handle), AuraError> {
        let session = self.session.as_ref().ok_or(AuraError::NotLoaded)?;

        match session.handle(controller) {
            Some(handle) => Ok((&session.sdk, handle)),
            None => {
                debug!(%controller, "No such Aura controller");
                Err(AuraError::NoController(controller))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::ffi::c_void;
    use std::path::Path;
    use std::rc::Rc;

    use super::*;

    #[derive(PartialEq, Eq, Debug, Clone)]
    enum Call {
        Enumerate(Family, Option<usize>),
        Create(Family),
        SetMode(Family, Handle, Mode),
        SetColor(Family, Handle, Vec<u8>),
        GetColor(Family, Handle, usize),
        LedCount(Family, Handle),
    }

    /// Simulated hardware behind the vendor SDK.
    #[derive(Default)]
    struct Hardware {
        load_fails: bool,
        motherboards: u32,
        gpus: u32,
        keyboard: bool,
        mouse: bool,
        /// Families whose discovery entry point is missing.
        broken: Vec<Family>,
        /// Controllers lost between the count and the fill enumeration.
        vanished: u32,
        led_count: u32,
        missing_set_mode: bool,
    }

    #[derive(Default)]
    struct State {
        hardware: RefCell<Hardware>,
        calls: RefCell<Vec<Call>>,
    }

    impl State {
        fn take_calls(&self) -> Vec<Call> {
            self.calls.borrow_mut().drain(..).collect()
        }
    }

    struct MockLoader(Rc<State>);

    impl SdkLoader for MockLoader {
        type Sdk = MockSdk;

        fn load(&self, path: &Path) -> Result<MockSdk, AuraError> {
            if self.0.hardware.borrow().load_fails {
                return Err(AuraError::LoadFailure {
                    path: path.to_path_buf(),
                    reason: "not found".into(),
                });
            }
            Ok(MockSdk(self.0.clone()))
        }
    }

    struct MockSdk(Rc<State>);

    impl MockSdk {
        fn record(&self, call: Call) {
            self.0.calls.borrow_mut().push(call);
        }

        fn check_discovery(&self, family: Family) -> Result<(), AuraError> {
            if self.0.hardware.borrow().broken.contains(&family) {
                return Err(AuraError::Unsupported { symbol: "Discovery" });
            }
            Ok(())
        }
    }

    impl VendorSdk for MockSdk {
        fn enumerate(
            &self,
            family: Family,
            buffer: Option<&mut [Handle]>,
        ) -> Result<u32, AuraError> {
            self.record(Call::Enumerate(family, buffer.as_ref().map(|buffer| buffer.len())));
            self.check_discovery(family)?;

            let hardware = self.0.hardware.borrow();
            let count = match family {
                Family::Motherboard => hardware.motherboards,
                Family::Gpu => hardware.gpus,
                _ => unreachable!("enumerate called for {family}"),
            };

            match buffer {
                Some(buffer) => {
                    let available = count.saturating_sub(hardware.vanished) as usize;
                    let filled = available.min(buffer.len());
                    for (index, handle) in buffer.iter_mut().take(filled).enumerate() {
                        *handle = handle_for(family, index);
                    }
                    Ok(filled as u32)
                },
                None => Ok(count),
            }
        }

        fn create(&self, family: Family) -> Result<Option<Handle>, AuraError> {
            self.record(Call::Create(family));
            self.check_discovery(family)?;

            let hardware = self.0.hardware.borrow();
            let present = match family {
                Family::Keyboard => hardware.keyboard,
                Family::Mouse => hardware.mouse,
                _ => unreachable!("create called for {family}"),
            };

            Ok(present.then(|| handle_for(family, 0)))
        }

        fn set_mode(&self, family: Family, handle: Handle, mode: Mode) -> Result<u32, AuraError> {
            self.record(Call::SetMode(family, handle, mode));
            if self.0.hardware.borrow().missing_set_mode {
                return Err(AuraError::Unsupported { symbol: "SetMbMode" });
            }
            Ok(1)
        }

        fn set_color(
            &self,
            family: Family,
            handle: Handle,
            colors: &[u8],
        ) -> Result<u32, AuraError> {
            self.record(Call::SetColor(family, handle, colors.to_vec()));
            Ok(1)
        }

        fn get_color(
            &self,
            family: Family,
            handle: Handle,
            buffer: &mut [u8],
        ) -> Result<u32, AuraError> {
            self.record(Call::GetColor(family, handle, buffer.len()));
            buffer.fill(0x7f);
            Ok(1)
        }

        fn led_count(&self, family: Family, handle: Handle) -> Result<u32, AuraError> {
            self.record(Call::LedCount(family, handle));
            Ok(self.0.hardware.borrow().led_count)
        }
    }

    /// Unique fake handle for each controller.
    fn handle_for(family: Family, index: usize) -> Handle {
        let tag = family as usize + 1;
        Handle::from_raw(((tag << 8) | (index + 1)) as *mut c_void)
    }

    fn sdk_with(hardware: Hardware) -> (AuraSdk<MockLoader>, Rc<State>) {
        sdk_with_config(hardware, SdkConfig::default())
    }

    fn sdk_with_config(
        hardware: Hardware,
        config: SdkConfig,
    ) -> (AuraSdk<MockLoader>, Rc<State>) {
        let state = Rc::new(State { hardware: RefCell::new(hardware), ..Default::default() });
        (AuraSdk::with_loader(MockLoader(state.clone()), config), state)
    }

    #[test]
    fn two_motherboards_no_gpu() {
        let hardware = Hardware { motherboards: 2, gpus: 0, led_count: 8, ..Default::default() };
        let (mut sdk, state) = sdk_with(hardware);
        sdk.load().unwrap();
        state.take_calls();

        assert_eq!(sdk.motherboard_count(), 2);
        assert_eq!(sdk.gpu_count(), 0);

        sdk.set_motherboard_mode(1, Mode(5)).unwrap();
        assert_eq!(state.take_calls(), vec![Call::SetMode(
            Family::Motherboard,
            handle_for(Family::Motherboard, 1),
            Mode(5)
        )]);

        assert_eq!(
            sdk.set_motherboard_mode(2, Mode(5)),
            Err(AuraError::NoController(Controller::Motherboard(2)))
        );
        assert_eq!(
            sdk.motherboard_led_count(5),
            Err(AuraError::NoController(Controller::Motherboard(5)))
        );
        assert_eq!(sdk.gpu_led_count(0), Err(AuraError::NoController(Controller::Gpu(0))));
        assert!(state.take_calls().is_empty());

        assert_eq!(sdk.motherboard_led_count(0), Ok(8));
    }

    #[test]
    fn discovery_calls_in_order() {
        let hardware = Hardware { motherboards: 1, gpus: 2, keyboard: true, ..Default::default() };
        let (mut sdk, state) = sdk_with(hardware);
        sdk.load().unwrap();

        assert_eq!(state.take_calls(), vec![
            Call::Create(Family::Keyboard),
            Call::Enumerate(Family::Motherboard, None),
            Call::Enumerate(Family::Motherboard, Some(1)),
            Call::Enumerate(Family::Gpu, None),
            Call::Enumerate(Family::Gpu, Some(2)),
            Call::Create(Family::Mouse),
        ]);
    }

    #[test]
    fn zero_motherboards() {
        let (mut sdk, state) = sdk_with(Hardware::default());
        sdk.load().unwrap();
        state.take_calls();

        assert!(sdk.is_loaded());
        assert_eq!(sdk.motherboard_count(), 0);
        assert!(sdk.set_motherboard_mode(0, Mode::SOFTWARE).unwrap_err().is_absent());
        assert!(sdk.set_motherboard_color(0, &[1, 2, 3]).unwrap_err().is_absent());
        assert!(sdk.motherboard_led_count(0).unwrap_err().is_absent());
        assert!(state.take_calls().is_empty());
    }

    #[test]
    fn failed_keyboard_discovery() {
        let hardware = Hardware {
            keyboard: true,
            mouse: true,
            broken: vec![Family::Keyboard],
            ..Default::default()
        };
        let (mut sdk, state) = sdk_with(hardware);
        sdk.load().unwrap();
        state.take_calls();

        assert!(!sdk.is_keyboard_present());
        assert!(sdk.is_mouse_present());

        let absent = Err(AuraError::NoController(Controller::Keyboard));
        assert_eq!(sdk.set_keyboard_mode(Mode(3)), absent);
        assert_eq!(sdk.keyboard_led_count(), Err(AuraError::NoController(Controller::Keyboard)));
        assert!(state.take_calls().is_empty());
    }

    #[test]
    fn failed_enumeration_does_not_stop_discovery() {
        let hardware = Hardware {
            motherboards: 2,
            gpus: 1,
            mouse: true,
            broken: vec![Family::Motherboard],
            ..Default::default()
        };
        let (mut sdk, _state) = sdk_with(hardware);
        sdk.load().unwrap();

        assert_eq!(sdk.motherboard_count(), 0);
        assert_eq!(sdk.gpu_count(), 1);
        assert!(sdk.is_mouse_present());
    }

    #[test]
    fn keyboard_present_after_discovery() {
        let (mut sdk, _state) = sdk_with(Hardware { keyboard: true, ..Default::default() });
        assert!(!sdk.is_keyboard_present());

        sdk.load().unwrap();
        assert!(sdk.is_keyboard_present());

        sdk.set_keyboard_mode(Mode::SOFTWARE).unwrap();
        assert!(sdk.is_keyboard_present());
    }

    #[test]
    fn reload_runs_fresh_discovery() {
        let hardware = Hardware { motherboards: 3, gpus: 1, keyboard: true, ..Default::default() };
        let (mut sdk, state) = sdk_with(hardware);
        sdk.load().unwrap();
        assert_eq!(sdk.motherboard_count(), 3);

        sdk.unload();
        assert!(!sdk.is_loaded());
        assert_eq!(sdk.motherboard_count(), 0);
        assert!(!sdk.is_keyboard_present());

        *state.hardware.borrow_mut() =
            Hardware { motherboards: 1, mouse: true, ..Default::default() };
        sdk.load().unwrap();

        assert_eq!(sdk.motherboard_count(), 1);
        assert_eq!(sdk.gpu_count(), 0);
        assert!(!sdk.is_keyboard_present());
        assert!(sdk.is_mouse_present());
    }

    #[test]
    fn load_while_loaded_reloads() {
        let (mut sdk, state) = sdk_with(Hardware { gpus: 2, ..Default::default() });
        sdk.load().unwrap();

        state.hardware.borrow_mut().gpus = 1;
        sdk.load().unwrap();

        assert_eq!(sdk.gpu_count(), 1);
    }

    #[test]
    fn double_unload() {
        let (mut sdk, _state) = sdk_with(Hardware { motherboards: 1, ..Default::default() });
        sdk.unload();

        sdk.load().unwrap();
        sdk.unload();
        sdk.unload();

        assert!(!sdk.is_loaded());
        assert_eq!(sdk.set_motherboard_mode(0, Mode::SOFTWARE), Err(AuraError::NotLoaded));
    }

    #[test]
    fn failed_load() {
        let hardware = Hardware { load_fails: true, motherboards: 2, ..Default::default() };
        let (mut sdk, state) = sdk_with(hardware);

        assert!(matches!(sdk.load(), Err(AuraError::LoadFailure { .. })));
        assert!(!sdk.is_loaded());
        assert_eq!(sdk.motherboard_count(), 0);
        assert!(sdk.controllers().is_empty());
        assert_eq!(sdk.mouse_led_count(), Err(AuraError::NotLoaded));
        assert!(state.take_calls().is_empty());
    }

    #[test]
    fn disabled_family_is_skipped() {
        let hardware = Hardware { gpus: 2, keyboard: true, ..Default::default() };
        let discovery = DiscoveryConfig::default().disable(Family::Gpu).disable(Family::Keyboard);
        let config = SdkConfig::default().with_discovery(discovery);
        let (mut sdk, state) = sdk_with_config(hardware, config);
        sdk.load().unwrap();

        assert_eq!(sdk.gpu_count(), 0);
        assert!(!sdk.is_keyboard_present());
        assert_eq!(state.take_calls(), vec![
            Call::Enumerate(Family::Motherboard, None),
            Call::Create(Family::Mouse),
        ]);
    }

    #[test]
    fn absent_controller_checked_before_color_buffer() {
        let (mut sdk, state) = sdk_with(Hardware { motherboards: 1, ..Default::default() });
        assert_eq!(sdk.set_gpu_color(0, &[]), Err(AuraError::NotLoaded));

        sdk.load().unwrap();
        state.take_calls();

        let absent = Err(AuraError::NoController(Controller::Motherboard(7)));
        assert_eq!(sdk.set_motherboard_color(7, &[]), absent);
        let absent = Err(AuraError::NoController(Controller::Keyboard));
        assert_eq!(sdk.set_keyboard_color(&[]), absent);
        assert_eq!(sdk.set_motherboard_color(0, &[]), Err(AuraError::EmptyColorBuffer));
        assert!(state.take_calls().is_empty());

        sdk.unload();
        assert_eq!(sdk.set_gpu_color(0, &[]), Err(AuraError::NotLoaded));
    }

    #[test]
    fn every_family_rejects_absent_controllers() {
        let (mut sdk, state) = sdk_with(Hardware::default());
        sdk.load().unwrap();
        state.take_calls();

        let controllers = [
            Controller::Motherboard(0),
            Controller::Motherboard(3),
            Controller::Gpu(0),
            Controller::Gpu(5),
            Controller::Keyboard,
            Controller::Mouse,
        ];

        for controller in controllers {
            let absent = AuraError::NoController(controller);
            assert_eq!(sdk.set_mode(controller, Mode::SOFTWARE), Err(absent.clone()));
            assert_eq!(sdk.set_color(controller, &[1, 2, 3]), Err(absent.clone()));
            assert_eq!(sdk.led_count(controller), Err(absent));
        }

        let absent = |controller| Err(AuraError::NoController(controller));
        assert_eq!(sdk.set_gpu_mode(2, Mode(4)), absent(Controller::Gpu(2)));
        assert_eq!(sdk.set_gpu_color(2, &[1]), absent(Controller::Gpu(2)));
        assert_eq!(sdk.set_keyboard_color(&[1]), absent(Controller::Keyboard));
        assert_eq!(sdk.set_mouse_mode(Mode::SOFTWARE), absent(Controller::Mouse));
        assert_eq!(sdk.set_mouse_color(&[1]), absent(Controller::Mouse));
        assert_eq!(sdk.mouse_led_count(), Err(AuraError::NoController(Controller::Mouse)));

        assert!(state.take_calls().is_empty());
    }

    #[test]
    fn controller_count_is_capped() {
        let (mut sdk, state) = sdk_with(Hardware { gpus: u32::MAX, ..Default::default() });
        sdk.load().unwrap();

        assert_eq!(sdk.gpu_count(), MAX_CONTROLLERS as usize);
        assert!(state
            .take_calls()
            .contains(&Call::Enumerate(Family::Gpu, Some(MAX_CONTROLLERS as usize))));
    }

    #[test]
    fn short_fill_truncates_controllers() {
        let hardware = Hardware { motherboards: 3, vanished: 1, ..Default::default() };
        let (mut sdk, _state) = sdk_with(hardware);
        sdk.load().unwrap();

        assert_eq!(sdk.motherboard_count(), 2);
    }

    #[test]
    fn color_buffer_passed_through() {
        let (mut sdk, state) = sdk_with(Hardware { gpus: 1, mouse: true, ..Default::default() });
        sdk.load().unwrap();
        state.take_calls();

        sdk.set_gpu_color(0, &[1, 2, 3, 4]).unwrap();
        sdk.set_mouse_color(&[9]).unwrap();

        assert_eq!(state.take_calls(), vec![
            Call::SetColor(Family::Gpu, handle_for(Family::Gpu, 0), vec![1, 2, 3, 4]),
            Call::SetColor(Family::Mouse, handle_for(Family::Mouse, 0), vec![9]),
        ]);
    }

    #[test]
    fn empty_color_buffer_rejected() {
        let (mut sdk, state) = sdk_with(Hardware { keyboard: true, ..Default::default() });
        sdk.load().unwrap();
        state.take_calls();

        assert_eq!(sdk.set_keyboard_color(&[]), Err(AuraError::EmptyColorBuffer));
        assert!(state.take_calls().is_empty());
    }

    #[test]
    fn unsupported_entry_point_is_reported() {
        let hardware = Hardware { motherboards: 1, missing_set_mode: true, ..Default::default() };
        let (mut sdk, _state) = sdk_with(hardware);
        sdk.load().unwrap();

        let err = sdk.set_motherboard_mode(0, Mode::SOFTWARE).unwrap_err();
        assert_eq!(err, AuraError::Unsupported { symbol: "SetMbMode" });
        assert!(!err.is_absent());
    }

    #[test]
    fn zero_leds_is_not_absent() {
        let hardware = Hardware { mouse: true, led_count: 0, ..Default::default() };
        let (mut sdk, _state) = sdk_with(hardware);
        sdk.load().unwrap();

        assert_eq!(sdk.mouse_led_count(), Ok(0));
        assert_eq!(sdk.keyboard_led_count(), Err(AuraError::NoController(Controller::Keyboard)));
    }

    #[test]
    fn read_motherboard_colors() {
        let (mut sdk, state) = sdk_with(Hardware { motherboards: 1, ..Default::default() });
        sdk.load().unwrap();
        state.take_calls();

        let mut buffer = [0; 6];
        assert_eq!(sdk.motherboard_color(0, &mut buffer), Ok(1));
        assert_eq!(buffer, [0x7f; 6]);
        assert_eq!(state.take_calls(), vec![Call::GetColor(
            Family::Motherboard,
            handle_for(Family::Motherboard, 0),
            6
        )]);

        assert!(sdk.motherboard_color(1, &mut buffer).unwrap_err().is_absent());
    }

    #[test]
    fn controllers_in_discovery_order() {
        let hardware = Hardware {
            motherboards: 2,
            gpus: 1,
            keyboard: true,
            mouse: true,
            ..Default::default()
        };
        let (mut sdk, _state) = sdk_with(hardware);
        sdk.load().unwrap();

        assert_eq!(sdk.controllers(), vec![
            Controller::Motherboard(0),
            Controller::Motherboard(1),
            Controller::Gpu(0),
            Controller::Keyboard,
            Controller::Mouse,
        ]);
    }
}
