//! Client for the JSON web-configuration API served by USB gamepad
//! controllers.
//!
//! The controller exposes get/set endpoints for its display, gamepad
//! behaviour, LEDs, pin mapping, add-ons, splash image and firmware
//! metadata. [`WebApiClient`] wraps each of them and converts between the
//! device's wire units and the units a configuration UI works with.

pub mod buttons;
pub mod client;
pub mod config;
pub mod error;
pub mod options;
pub mod transform;
pub mod transport;

pub use buttons::{Button, ButtonGroup, ButtonMappingSet, PinMapping, UNASSIGNED_PIN};
pub use client::WebApiClient;
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ApiResult};
pub use options::{
    AddonsOptions, DisplayButtonLayouts, DisplayOptions, DisplayTarget, FirmwareVersion,
    GamepadOptions, LedOptions, MemoryReport, SplashImage,
};
pub use transform::FormValue;
pub use transport::{HttpTransport, Transport};
