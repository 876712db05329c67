//! High-level client for the controller's web-configuration API.
//!
//! One async method per device capability. Every method logs a fault at the
//! call site and returns it as an [`ApiError`]; nothing here panics on bad
//! input or a dead device. Callers wanting the "soft" behaviour can reduce a
//! result with `.ok()` (reads) or `.is_ok()` (updates).

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::buttons::ButtonMappingSet;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::options::{
    AddonsOptions, DisplayButtonLayouts, DisplayOptions, DisplayTarget, FirmwareVersion,
    GamepadOptions, LedOptions, MemoryReport, SplashImage, WireDisplayOptions,
};
use crate::transform::encode_splash_image;
use crate::transport::{HttpTransport, Transport};

pub const RESET_SETTINGS: &str = "/api/resetSettings";
pub const GET_DISPLAY_OPTIONS: &str = "/api/getDisplayOptions";
pub const SET_DISPLAY_OPTIONS: &str = "/api/setDisplayOptions";
pub const SET_PREVIEW_DISPLAY_OPTIONS: &str = "/api/setPreviewDisplayOptions";
pub const GET_GAMEPAD_OPTIONS: &str = "/api/getGamepadOptions";
pub const SET_GAMEPAD_OPTIONS: &str = "/api/setGamepadOptions";
pub const GET_LED_OPTIONS: &str = "/api/getLedOptions";
pub const SET_LED_OPTIONS: &str = "/api/setLedOptions";
pub const GET_PIN_MAPPINGS: &str = "/api/getPinMappings";
pub const SET_PIN_MAPPINGS: &str = "/api/setPinMappings";
pub const GET_ADDONS_OPTIONS: &str = "/api/getAddonsOptions";
pub const SET_ADDONS_OPTIONS: &str = "/api/setAddonsOptions";
pub const GET_SPLASH_IMAGE: &str = "/api/getSplashImage";
pub const SET_SPLASH_IMAGE: &str = "/api/setSplashImage";
pub const GET_FIRMWARE_VERSION: &str = "/api/getFirmwareVersion";
pub const GET_MEMORY_REPORT: &str = "/api/getMemoryReport";
pub const REBOOT: &str = "/api/reboot";
pub const GET_DISPLAY_BUTTON_LAYOUTS: &str = "/api/getDisplayButtonLayouts";
pub const GET_DISPLAY_BUTTON_LAYOUTS_RIGHT: &str = "/api/getDisplayButtonLayoutsRight";
pub const GET_LED_BUTTON_LAYOUTS: &str = "/api/getLEDButtonLayouts";

/// A client for one controller.
pub struct WebApiClient {
    transport: Box<dyn Transport>,
    template: ButtonMappingSet,
}

impl WebApiClient {
    /// Build a client talking HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(Box::new(transport), config.button_template))
    }

    /// Build a client on top of any transport.
    pub fn with_transport(transport: Box<dyn Transport>, template: ButtonMappingSet) -> Self {
        Self {
            transport,
            template,
        }
    }

    // -----------------------------------------------------------------------
    // System
    // -----------------------------------------------------------------------

    pub async fn reset_settings(&self) -> ApiResult<Value> {
        self.get_json(RESET_SETTINGS).await
    }

    pub async fn reboot(&self) -> ApiResult<Value> {
        self.get_json(REBOOT).await
    }

    pub async fn get_firmware_version(&self) -> ApiResult<FirmwareVersion> {
        self.get_typed(GET_FIRMWARE_VERSION).await
    }

    pub async fn get_memory_report(&self) -> ApiResult<MemoryReport> {
        self.get_typed(GET_MEMORY_REPORT).await
    }

    // -----------------------------------------------------------------------
    // Display
    // -----------------------------------------------------------------------

    /// Display options in UI units (seconds, minutes, `0x..` address).
    pub async fn get_display_options(&self) -> ApiResult<DisplayOptions> {
        let wire: WireDisplayOptions = self.get_typed(GET_DISPLAY_OPTIONS).await?;
        Ok(DisplayOptions::from_wire(wire))
    }

    /// Save or preview display options.
    pub async fn set_display_options(
        &self,
        options: &DisplayOptions,
        target: DisplayTarget,
    ) -> ApiResult<()> {
        let path = match target {
            DisplayTarget::Save => SET_DISPLAY_OPTIONS,
            DisplayTarget::Preview => SET_PREVIEW_DISPLAY_OPTIONS,
        };
        self.update(path, &options.to_wire()).await
    }

    /// Left and right button-cluster layouts, fetched concurrently and merged.
    ///
    /// A failed side contributes nothing, so two failures merge to an empty set.
    pub async fn get_display_button_layouts(&self) -> ApiResult<DisplayButtonLayouts> {
        let (primary, right) = tokio::join!(
            self.get_json(GET_DISPLAY_BUTTON_LAYOUTS),
            self.get_json(GET_DISPLAY_BUTTON_LAYOUTS_RIGHT),
        );

        Ok(DisplayButtonLayouts::merge(primary.ok(), right.ok()))
    }

    pub async fn get_splash_image(&self) -> ApiResult<SplashImage> {
        self.get_typed(GET_SPLASH_IMAGE).await
    }

    /// Upload a raw splash bitmap. The device's reply is returned as-is.
    pub async fn set_splash_image(&self, image: &[u8]) -> ApiResult<Value> {
        let mut body = Map::new();
        body.insert(
            "splashImage".to_string(),
            Value::String(encode_splash_image(image)),
        );
        self.post_json(SET_SPLASH_IMAGE, &body).await
    }

    // -----------------------------------------------------------------------
    // Gamepad, LEDs, add-ons
    // -----------------------------------------------------------------------

    pub async fn get_gamepad_options(&self) -> ApiResult<GamepadOptions> {
        self.get_typed(GET_GAMEPAD_OPTIONS).await
    }

    pub async fn set_gamepad_options(&self, options: &GamepadOptions) -> ApiResult<()> {
        self.update(SET_GAMEPAD_OPTIONS, options).await
    }

    pub async fn get_led_options(&self) -> ApiResult<LedOptions> {
        self.get_typed(GET_LED_OPTIONS).await
    }

    pub async fn set_led_options(&self, options: &LedOptions) -> ApiResult<()> {
        self.update(SET_LED_OPTIONS, &options.to_wire()).await
    }

    pub async fn get_led_button_layouts(&self) -> ApiResult<Value> {
        self.get_json(GET_LED_BUTTON_LAYOUTS).await
    }

    pub async fn get_addons_options(&self) -> ApiResult<AddonsOptions> {
        self.get_typed(GET_ADDONS_OPTIONS).await
    }

    pub async fn set_addons_options(&self, options: &AddonsOptions) -> ApiResult<()> {
        self.update(SET_ADDONS_OPTIONS, options).await
    }

    // -----------------------------------------------------------------------
    // Pin mappings
    // -----------------------------------------------------------------------

    /// Pin mappings for every canonical button, whatever the device returned.
    pub async fn get_pin_mappings(&self) -> ApiResult<ButtonMappingSet> {
        let remote: Map<String, Value> = self.get_typed(GET_PIN_MAPPINGS).await?;
        Ok(ButtonMappingSet::normalize(&self.template, &remote))
    }

    pub async fn set_pin_mappings(&self, mappings: &ButtonMappingSet) -> ApiResult<()> {
        self.update(SET_PIN_MAPPINGS, &mappings.to_wire()).await
    }

    // -----------------------------------------------------------------------
    // Generic helpers
    // -----------------------------------------------------------------------

    async fn get_json(&self, path: &str) -> ApiResult<Value> {
        self.transport
            .get(path)
            .await
            .inspect_err(|e| warn!("GET {} failed: {}", path, e))
    }

    async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let body = self.get_json(path).await?;
        serde_json::from_value(body)
            .map_err(|e| ApiError::malformed(path, e))
            .inspect_err(|e| warn!("GET {} failed: {}", path, e))
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::encode(path, e))
            .inspect_err(|e| warn!("POST {} failed: {}", path, e))?;
        self.transport
            .post(path, &body)
            .await
            .inspect_err(|e| warn!("POST {} failed: {}", path, e))
    }

    /* Updates only report success; the device's reply goes to the debug log. */
    async fn update<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        let reply = self.post_json(path, body).await?;
        debug!("{} replied: {}", path, reply);
        Ok(())
    }
}
