/* Option records exchanged with the controller.
 *
 * Most records are forwarded as-is. Display options carry unit conversions in
 * both directions, LED options coerce one field on the way out, and the
 * display button layouts are split across two resources on the device. */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transform::{
    FormValue, format_i2c_address, millis_from_minutes, millis_from_seconds, minutes_from_millis,
    seconds_from_millis,
};

/* Display fields that the device derives itself; always cleared on update. */
const DISPLAY_WRITE_ONLY_FIELDS: [&str; 3] = [
    "splashImage",
    "displayButtonLayouts",
    "displayButtonLayoutsRight",
];

/* ------------------------------------------------------------------ */
/* Display options                                                      */
/* ------------------------------------------------------------------ */

/// Display options as the controller sends and receives them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDisplayOptions {
    pub i2c_address: Option<i64>,
    pub button_layout: Option<i64>,
    pub button_layout_right: Option<i64>,
    pub splash_mode: Option<i64>,
    pub splash_choice: Option<i64>,
    /* milliseconds */
    pub splash_duration: Option<i64>,
    /* milliseconds */
    pub display_saver_timeout: Option<i64>,
    #[serde(default)]
    pub splash_image: Value,
    #[serde(default)]
    pub display_button_layouts: Value,
    #[serde(default)]
    pub display_button_layouts_right: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Display options in UI units.
///
/// `splash_duration` is in seconds, `display_saver_timeout` in minutes and
/// `i2c_address` is a `0x..` string. Fields this crate does not interpret
/// (pins, flip/invert flags, ...) live in `extra` and round-trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayOptions {
    #[serde(default)]
    pub i2c_address: FormValue,
    #[serde(default)]
    pub button_layout: FormValue,
    #[serde(default)]
    pub button_layout_right: FormValue,
    #[serde(default)]
    pub splash_mode: FormValue,
    #[serde(default)]
    pub splash_choice: FormValue,
    #[serde(default)]
    pub splash_duration: FormValue,
    #[serde(default)]
    pub display_saver_timeout: FormValue,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn passthrough_int(value: Option<i64>) -> FormValue {
    value.map(FormValue::from).unwrap_or_default()
}

impl DisplayOptions {
    pub fn from_wire(wire: WireDisplayOptions) -> Self {
        let i2c_address = match wire.i2c_address {
            Some(address) if address != 0 => FormValue::from(format_i2c_address(address)),
            other => passthrough_int(other),
        };

        let mut extra = wire.extra;
        for (key, value) in DISPLAY_WRITE_ONLY_FIELDS.into_iter().zip([
            wire.splash_image,
            wire.display_button_layouts,
            wire.display_button_layouts_right,
        ]) {
            if !value.is_null() {
                extra.insert(key.to_string(), value);
            }
        }

        Self {
            i2c_address,
            button_layout: passthrough_int(wire.button_layout),
            button_layout_right: passthrough_int(wire.button_layout_right),
            splash_mode: passthrough_int(wire.splash_mode),
            splash_choice: passthrough_int(wire.splash_choice),
            splash_duration: wire
                .splash_duration
                .map(seconds_from_millis)
                .unwrap_or_default(),
            display_saver_timeout: wire
                .display_saver_timeout
                .map(minutes_from_millis)
                .unwrap_or_default(),
            extra,
        }
    }

    /* Build the update body. Write-only fields are reset no matter what the
     * caller put in `extra`. */
    pub fn to_wire(&self) -> WireDisplayOptions {
        let mut extra = self.extra.clone();
        for key in DISPLAY_WRITE_ONLY_FIELDS {
            extra.remove(key);
        }

        WireDisplayOptions {
            i2c_address: self.i2c_address.to_int(),
            button_layout: self.button_layout.to_int(),
            button_layout_right: self.button_layout_right.to_int(),
            splash_mode: self.splash_mode.to_int(),
            splash_choice: self.splash_choice.to_int(),
            splash_duration: millis_from_seconds(&self.splash_duration),
            display_saver_timeout: millis_from_minutes(&self.display_saver_timeout),
            splash_image: Value::String(String::new()),
            display_button_layouts: Value::Null,
            display_button_layouts_right: Value::Null,
            extra,
        }
    }
}

/* Where a display options update goes. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayTarget {
    /* Persist to flash. */
    #[default]
    Save,
    /* Render on the attached display without persisting. */
    Preview,
}

/* ------------------------------------------------------------------ */
/* Passthrough records                                                  */
/* ------------------------------------------------------------------ */

/// Gamepad behaviour options; forwarded unmodified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GamepadOptions(pub Map<String, Value>);

/// Add-on options; forwarded unmodified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddonsOptions(pub Map<String, Value>);

/// LED options; forwarded unmodified except for `ledLayout`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedOptions(pub Map<String, Value>);

impl LedOptions {
    /* `ledLayout` is coerced to an integer when present and truthy; a value
     * that does not coerce is sent as `null`. */
    pub fn to_wire(&self) -> Map<String, Value> {
        let mut wire = self.0.clone();
        if let Some(layout) = wire.get_mut("ledLayout") {
            let form = FormValue(layout.clone());
            if form.is_truthy() {
                *layout = form.to_int().map(Value::from).unwrap_or(Value::Null);
            }
        }
        wire
    }
}

/* ------------------------------------------------------------------ */
/* Splash image and firmware metadata                                   */
/* ------------------------------------------------------------------ */

/// Splash image as returned by the controller. The payload is left encoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplashImage {
    #[serde(default)]
    pub splash_image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/* Flash and heap usage in bytes. */
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryReport {
    pub total_flash: Option<u64>,
    pub used_flash: Option<u64>,
    pub static_allocs: Option<u64>,
    pub total_heap: Option<u64>,
    pub used_heap: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/* ------------------------------------------------------------------ */
/* Display button layouts                                               */
/* ------------------------------------------------------------------ */

/// Layouts for the left and right button clusters, merged into one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayButtonLayouts(pub Map<String, Value>);

impl DisplayButtonLayouts {
    /* Union of both resources. A missing or non-object side contributes
     * nothing; on a key collision the right side wins. */
    pub fn merge(primary: Option<Value>, right: Option<Value>) -> Self {
        let mut merged = Map::new();
        for side in [primary, right].into_iter().flatten() {
            if let Value::Object(map) = side {
                merged.extend(map);
            }
        }
        DisplayButtonLayouts(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_options_from_wire_converts_units() {
        let wire: WireDisplayOptions = serde_json::from_value(json!({
            "enabled": 1,
            "i2cAddress": 60,
            "buttonLayout": 2,
            "buttonLayoutRight": 3,
            "splashMode": 1,
            "splashChoice": 0,
            "splashDuration": 5000,
            "displaySaverTimeout": 120000,
            "flipDisplay": 0
        }))
        .expect("valid wire options");

        let opts = DisplayOptions::from_wire(wire);
        assert_eq!(opts.i2c_address, FormValue::from("0x3c"));
        assert_eq!(opts.splash_duration, FormValue::from(5));
        assert_eq!(opts.display_saver_timeout, FormValue::from(2));
        assert_eq!(opts.button_layout, FormValue::from(2));
        assert_eq!(opts.extra["enabled"], json!(1));
        assert_eq!(opts.extra["flipDisplay"], json!(0));
    }

    #[test]
    fn zero_i2c_address_is_left_alone() {
        let wire = WireDisplayOptions {
            i2c_address: Some(0),
            ..Default::default()
        };
        assert_eq!(DisplayOptions::from_wire(wire).i2c_address, FormValue::from(0));
    }

    #[test]
    fn display_update_body_matches_controller_format() {
        let opts = DisplayOptions {
            splash_duration: "3".into(),
            display_saver_timeout: "2".into(),
            i2c_address: "32".into(),
            button_layout: "0".into(),
            button_layout_right: "0".into(),
            splash_mode: "0".into(),
            splash_choice: "0".into(),
            extra: Map::new(),
        };

        let body = serde_json::to_value(opts.to_wire()).expect("serializable");
        assert_eq!(body["splashDuration"], json!(3000));
        assert_eq!(body["displaySaverTimeout"], json!(120000));
        assert_eq!(body["i2cAddress"], json!(32));
        assert_eq!(body["buttonLayout"], json!(0));
        assert_eq!(body["splashImage"], json!(""));
        assert_eq!(body["displayButtonLayouts"], Value::Null);
        assert_eq!(body["displayButtonLayoutsRight"], Value::Null);
    }

    #[test]
    fn display_update_accepts_hex_address_and_clears_caller_placeholders() {
        let mut extra = Map::new();
        extra.insert("splashImage".into(), json!("AAAA"));
        extra.insert("displayButtonLayouts".into(), json!({ "buttonLayout": {} }));
        extra.insert("invertDisplay".into(), json!(1));

        let opts = DisplayOptions {
            i2c_address: "0x3C".into(),
            splash_mode: "oops".into(),
            extra,
            ..Default::default()
        };

        let body = serde_json::to_value(opts.to_wire()).expect("serializable");
        assert_eq!(body["i2cAddress"], json!(60));
        assert_eq!(body["splashMode"], Value::Null);
        assert_eq!(body["splashImage"], json!(""));
        assert_eq!(body["displayButtonLayouts"], Value::Null);
        assert_eq!(body["invertDisplay"], json!(1));
    }

    #[test]
    fn led_layout_is_coerced_when_truthy() {
        let opts: LedOptions = serde_json::from_value(json!({
            "dataPin": 15,
            "ledLayout": "2",
            "ledFormat": 0
        }))
        .expect("object");
        let wire = opts.to_wire();
        assert_eq!(wire["ledLayout"], json!(2));
        assert_eq!(wire["dataPin"], json!(15));
    }

    #[test]
    fn led_layout_falsy_or_missing_is_forwarded() {
        let empty: LedOptions =
            serde_json::from_value(json!({ "ledLayout": "" })).expect("object");
        assert_eq!(empty.to_wire()["ledLayout"], json!(""));

        let absent: LedOptions =
            serde_json::from_value(json!({ "brightnessMaximum": 100 })).expect("object");
        assert!(!absent.to_wire().contains_key("ledLayout"));

        let junk: LedOptions =
            serde_json::from_value(json!({ "ledLayout": "grid" })).expect("object");
        assert_eq!(junk.to_wire()["ledLayout"], Value::Null);
    }

    #[test]
    fn layouts_merge_union() {
        let merged =
            DisplayButtonLayouts::merge(Some(json!({ "left": 1 })), Some(json!({ "right": 2 })));
        assert_eq!(
            serde_json::to_value(merged).expect("object"),
            json!({ "left": 1, "right": 2 })
        );
    }

    #[test]
    fn layouts_merge_with_missing_side() {
        let merged = DisplayButtonLayouts::merge(Some(json!({ "left": 1 })), None);
        assert_eq!(
            merged,
            DisplayButtonLayouts::merge(Some(json!({ "left": 1 })), Some(Value::Null))
        );
        assert_eq!(serde_json::to_value(merged).expect("object"), json!({ "left": 1 }));
    }

    #[test]
    fn memory_report_keeps_unknown_fields() {
        let report: MemoryReport = serde_json::from_value(json!({
            "totalFlash": 2097152,
            "usedFlash": 1048576,
            "staticAllocs": 2048,
            "totalHeap": 262144,
            "usedHeap": 16384,
            "board": "pico"
        }))
        .expect("report");
        assert_eq!(report.total_flash, Some(2_097_152));
        assert_eq!(report.extra["board"], json!("pico"));
    }
}
