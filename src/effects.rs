//! Built-in haptic effects per platform.
//!
//! Both enumerations are closed; the mapping to the native player's symbolic
//! names is an exhaustive `match`, so adding a variant without a name is a
//! compile error rather than a runtime fallback.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Predefined effects understood by the Android player's `playBuiltIn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AndroidBuiltInEffect {
    Click,
    DoubleClick,
    HeavyClick,
    Tick,
}

impl AndroidBuiltInEffect {
    pub const ALL: [AndroidBuiltInEffect; 4] = [
        AndroidBuiltInEffect::Click,
        AndroidBuiltInEffect::DoubleClick,
        AndroidBuiltInEffect::HeavyClick,
        AndroidBuiltInEffect::Tick,
    ];

    /// Name passed to `HapticlabsPlayer.playBuiltIn`.
    pub fn native_name(self) -> &'static str {
        match self {
            AndroidBuiltInEffect::Click => "Click",
            AndroidBuiltInEffect::DoubleClick => "Double Click",
            AndroidBuiltInEffect::HeavyClick => "Heavy Click",
            AndroidBuiltInEffect::Tick => "Tick",
        }
    }
}

/// Predefined effects understood by `_playPredefinedIOSVibration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IosBuiltInEffect {
    Light,
    Medium,
    Heavy,
    Rigid,
    Soft,
    Error,
    Warning,
    Success,
    Selection,
}

impl IosBuiltInEffect {
    pub const ALL: [IosBuiltInEffect; 9] = [
        IosBuiltInEffect::Light,
        IosBuiltInEffect::Medium,
        IosBuiltInEffect::Heavy,
        IosBuiltInEffect::Rigid,
        IosBuiltInEffect::Soft,
        IosBuiltInEffect::Error,
        IosBuiltInEffect::Warning,
        IosBuiltInEffect::Success,
        IosBuiltInEffect::Selection,
    ];

    pub fn native_name(self) -> &'static str {
        match self {
            IosBuiltInEffect::Light => "light",
            IosBuiltInEffect::Medium => "medium",
            IosBuiltInEffect::Heavy => "heavy",
            IosBuiltInEffect::Rigid => "rigid",
            IosBuiltInEffect::Soft => "soft",
            IosBuiltInEffect::Error => "error",
            IosBuiltInEffect::Warning => "warning",
            IosBuiltInEffect::Success => "success",
            IosBuiltInEffect::Selection => "selection",
        }
    }
}

impl fmt::Display for AndroidBuiltInEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.native_name())
    }
}

impl fmt::Display for IosBuiltInEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.native_name())
    }
}

/// Normalize user input: case-insensitive, ignoring spaces, dashes and underscores.
fn effect_key(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for AndroidBuiltInEffect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = effect_key(s);
        Self::ALL
            .into_iter()
            .find(|effect| effect_key(effect.native_name()) == key)
            .ok_or_else(|| format!("unknown Android built-in effect '{}'", s))
    }
}

impl FromStr for IosBuiltInEffect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = effect_key(s);
        Self::ALL
            .into_iter()
            .find(|effect| effect.native_name() == key)
            .ok_or_else(|| format!("unknown iOS built-in effect '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_android_names_cover_every_variant() {
        let table = [
            (AndroidBuiltInEffect::Click, "Click"),
            (AndroidBuiltInEffect::DoubleClick, "Double Click"),
            (AndroidBuiltInEffect::HeavyClick, "Heavy Click"),
            (AndroidBuiltInEffect::Tick, "Tick"),
        ];
        assert_eq!(table.len(), AndroidBuiltInEffect::ALL.len());
        for (effect, expected) in table {
            assert_eq!(effect.native_name(), expected);
        }
    }

    #[test]
    fn test_ios_names_cover_every_variant() {
        let table = [
            (IosBuiltInEffect::Light, "light"),
            (IosBuiltInEffect::Medium, "medium"),
            (IosBuiltInEffect::Heavy, "heavy"),
            (IosBuiltInEffect::Rigid, "rigid"),
            (IosBuiltInEffect::Soft, "soft"),
            (IosBuiltInEffect::Error, "error"),
            (IosBuiltInEffect::Warning, "warning"),
            (IosBuiltInEffect::Success, "success"),
            (IosBuiltInEffect::Selection, "selection"),
        ];
        assert_eq!(table.len(), IosBuiltInEffect::ALL.len());
        for (effect, expected) in table {
            assert_eq!(effect.native_name(), expected);
        }
    }

    #[test]
    fn test_parse_accepts_loose_spelling() {
        assert_eq!(
            "double-click".parse::<AndroidBuiltInEffect>(),
            Ok(AndroidBuiltInEffect::DoubleClick)
        );
        assert_eq!(
            "Heavy Click".parse::<AndroidBuiltInEffect>(),
            Ok(AndroidBuiltInEffect::HeavyClick)
        );
        assert_eq!(
            "SELECTION".parse::<IosBuiltInEffect>(),
            Ok(IosBuiltInEffect::Selection)
        );
        assert!("buzz".parse::<IosBuiltInEffect>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&AndroidBuiltInEffect::HeavyClick).unwrap();
        assert_eq!(json, "\"heavy_click\"");
        let parsed: IosBuiltInEffect = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(parsed, IosBuiltInEffect::Warning);
    }
}
