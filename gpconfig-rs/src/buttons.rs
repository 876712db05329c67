/* Canonical button set and the pin-mapping model built on top of it. */

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::transform::parse_int;

/* Pin value meaning "not mapped". */
pub const UNASSIGNED_PIN: i32 = -1;

/* Logical controller inputs, in canonical order. The serialized name is the
 * variant name, which is also the key the controller uses. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    B1,
    B2,
    B3,
    B4,
    L1,
    R1,
    L2,
    R2,
    S1,
    S2,
    L3,
    R3,
    A1,
    A2,
}

/* Coarse grouping of buttons, used for display. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonGroup {
    Directional,
    Face,
    Shoulder,
    System,
    Stick,
    Auxiliary,
}

impl Button {
    pub const ALL: [Button; 18] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::B1,
        Button::B2,
        Button::B3,
        Button::B4,
        Button::L1,
        Button::R1,
        Button::L2,
        Button::R2,
        Button::S1,
        Button::S2,
        Button::L3,
        Button::R3,
        Button::A1,
        Button::A2,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Button::Up => "Up",
            Button::Down => "Down",
            Button::Left => "Left",
            Button::Right => "Right",
            Button::B1 => "B1",
            Button::B2 => "B2",
            Button::B3 => "B3",
            Button::B4 => "B4",
            Button::L1 => "L1",
            Button::R1 => "R1",
            Button::L2 => "L2",
            Button::R2 => "R2",
            Button::S1 => "S1",
            Button::S2 => "S2",
            Button::L3 => "L3",
            Button::R3 => "R3",
            Button::A1 => "A1",
            Button::A2 => "A2",
        }
    }

    pub fn group(self) -> ButtonGroup {
        match self {
            Button::Up | Button::Down | Button::Left | Button::Right => ButtonGroup::Directional,
            Button::B1 | Button::B2 | Button::B3 | Button::B4 => ButtonGroup::Face,
            Button::L1 | Button::R1 | Button::L2 | Button::R2 => ButtonGroup::Shoulder,
            Button::S1 | Button::S2 => ButtonGroup::System,
            Button::L3 | Button::R3 => ButtonGroup::Stick,
            Button::A1 | Button::A2 => ButtonGroup::Auxiliary,
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/* Case-insensitive, so "b1" and "up" work from the command line. */
impl FromStr for Button {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Button::ALL
            .iter()
            .copied()
            .find(|b| b.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown button '{}'", s))
    }
}

/* One button's GPIO assignment plus an optional validation message. */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinMapping {
    pub pin: i32,
    pub error: Option<String>,
}

impl PinMapping {
    pub fn unassigned() -> Self {
        Self {
            pin: UNASSIGNED_PIN,
            error: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.pin != UNASSIGNED_PIN
    }
}

impl Default for PinMapping {
    fn default() -> Self {
        Self::unassigned()
    }
}

/// Pin assignment for every canonical button.
///
/// The key set is always exactly [`Button::ALL`]: construction goes through
/// the canonical template and nothing ever removes a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ButtonMappingSet {
    mappings: BTreeMap<Button, PinMapping>,
}

impl ButtonMappingSet {
    /* Every button unassigned with no error. */
    pub fn canonical() -> Self {
        Self {
            mappings: Button::ALL
                .iter()
                .map(|&b| (b, PinMapping::unassigned()))
                .collect(),
        }
    }

    pub fn get(&self, button: Button) -> &PinMapping {
        /* Safe: every canonical key is present by construction. */
        &self.mappings[&button]
    }

    pub fn set_pin(&mut self, button: Button, pin: i32) {
        if let Some(mapping) = self.mappings.get_mut(&button) {
            mapping.pin = pin;
            mapping.error = None;
        }
    }

    pub fn set_error(&mut self, button: Button, error: impl Into<String>) {
        if let Some(mapping) = self.mappings.get_mut(&button) {
            mapping.error = Some(error.into());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Button, &PinMapping)> {
        self.mappings.iter().map(|(b, m)| (*b, m))
    }

    /* Overlay a controller response onto a copy of `template`.
     *
     * Keys that are not canonical buttons are dropped. A recognised key whose
     * value does not coerce to an integer stays unassigned and carries an
     * error message instead. */
    pub fn normalize(template: &ButtonMappingSet, remote: &Map<String, Value>) -> Self {
        let mut mappings = template.clone();

        for (key, value) in remote {
            let Ok(button) = key.parse::<Button>() else {
                debug!("Ignoring unknown pin mapping key '{}'", key);
                continue;
            };
            /* Keys must match exactly on the wire; case folding is for humans. */
            if button.as_str() != key {
                debug!("Ignoring non-canonical pin mapping key '{}'", key);
                continue;
            }

            match parse_int(value).and_then(|p| i32::try_from(p).ok()) {
                Some(pin) => mappings.set_pin(button, pin),
                None => {
                    mappings.set_pin(button, UNASSIGNED_PIN);
                    mappings.set_error(button, format!("Invalid pin value {}", value));
                }
            }
        }

        mappings
    }

    /* Flat `button -> pin` object sent to the controller. */
    pub fn to_wire(&self) -> BTreeMap<Button, i32> {
        self.mappings.iter().map(|(b, m)| (*b, m.pin)).collect()
    }
}

impl Default for ButtonMappingSet {
    fn default() -> Self {
        Self::canonical()
    }
}
