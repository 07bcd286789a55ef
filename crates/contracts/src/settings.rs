use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading or updating modal settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("option `{key}` expects {expected}")]
    InvalidValue { key: OptionKey, expected: &'static str },
    #[error("malformed options: {0}")]
    Malformed(String),
}

/// Settings record of one modal instance.
///
/// Field names serialize in camelCase so a JS options object maps onto it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalSettings {
    pub background_color: String,
    pub open_selector: Option<String>,
    pub auto_open: bool,
    pub close_selector: Option<String>,
    pub show_close_button: bool,
    /// Animation duration in milliseconds.
    pub animation_duration: u32,
}

impl Default for ModalSettings {
    fn default() -> Self {
        Self {
            background_color: "#fff".to_string(),
            open_selector: None,
            auto_open: false,
            close_selector: Some(".close-modal".to_string()),
            show_close_button: true,
            animation_duration: 200,
        }
    }
}

/// Partial settings; present fields override the target record.
///
/// A selector given as `null` clears it, an absent selector leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub open_selector: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_open: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub close_selector: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_close_button: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_duration: Option<u32>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl SettingsPatch {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::Malformed(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Keys present in this patch, in declaration order.
    pub fn keys(&self) -> Vec<OptionKey> {
        let mut keys = Vec::new();
        if self.background_color.is_some() {
            keys.push(OptionKey::BackgroundColor);
        }
        if self.open_selector.is_some() {
            keys.push(OptionKey::OpenSelector);
        }
        if self.auto_open.is_some() {
            keys.push(OptionKey::AutoOpen);
        }
        if self.close_selector.is_some() {
            keys.push(OptionKey::CloseSelector);
        }
        if self.show_close_button.is_some() {
            keys.push(OptionKey::ShowCloseButton);
        }
        if self.animation_duration.is_some() {
            keys.push(OptionKey::AnimationDuration);
        }
        keys
    }
}

impl ModalSettings {
    /// Defaults overlaid with a JSON options object.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        settings.apply(SettingsPatch::from_json(json)?);
        Ok(settings)
    }

    pub fn with_patch(mut self, patch: SettingsPatch) -> Self {
        self.apply(patch);
        self
    }

    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(color) = patch.background_color {
            self.background_color = color;
        }
        if let Some(selector) = patch.open_selector {
            self.open_selector = selector;
        }
        if let Some(auto_open) = patch.auto_open {
            self.auto_open = auto_open;
        }
        if let Some(selector) = patch.close_selector {
            self.close_selector = selector;
        }
        if let Some(show) = patch.show_close_button {
            self.show_close_button = show;
        }
        if let Some(duration) = patch.animation_duration {
            self.animation_duration = duration;
        }
    }

    pub fn get(&self, key: OptionKey) -> OptionValue {
        match key {
            OptionKey::BackgroundColor => OptionValue::Text(self.background_color.clone()),
            OptionKey::OpenSelector => self.open_selector.clone().into(),
            OptionKey::AutoOpen => OptionValue::Bool(self.auto_open),
            OptionKey::CloseSelector => self.close_selector.clone().into(),
            OptionKey::ShowCloseButton => OptionValue::Bool(self.show_close_button),
            OptionKey::AnimationDuration => OptionValue::Number(f64::from(self.animation_duration)),
        }
    }

    pub fn set(&mut self, key: OptionKey, value: OptionValue) -> Result<(), SettingsError> {
        let invalid = |expected| SettingsError::InvalidValue { key, expected };
        match key {
            OptionKey::BackgroundColor => {
                self.background_color = value.into_text().ok_or_else(|| invalid("a string"))?;
            }
            OptionKey::OpenSelector => {
                self.open_selector = value
                    .into_selector()
                    .ok_or_else(|| invalid("a selector string or null"))?;
            }
            OptionKey::AutoOpen => {
                self.auto_open = value.as_bool().ok_or_else(|| invalid("a boolean"))?;
            }
            OptionKey::CloseSelector => {
                self.close_selector = value
                    .into_selector()
                    .ok_or_else(|| invalid("a selector string or null"))?;
            }
            OptionKey::ShowCloseButton => {
                self.show_close_button = value.as_bool().ok_or_else(|| invalid("a boolean"))?;
            }
            OptionKey::AnimationDuration => {
                self.animation_duration = value
                    .as_millis()
                    .ok_or_else(|| invalid("a non-negative integer"))?;
            }
        }
        Ok(())
    }
}

/// Names of the data options, as spelled in a JS options object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    BackgroundColor,
    OpenSelector,
    AutoOpen,
    CloseSelector,
    ShowCloseButton,
    AnimationDuration,
}

impl OptionKey {
    pub const ALL: [OptionKey; 6] = [
        OptionKey::BackgroundColor,
        OptionKey::OpenSelector,
        OptionKey::AutoOpen,
        OptionKey::CloseSelector,
        OptionKey::ShowCloseButton,
        OptionKey::AnimationDuration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::BackgroundColor => "backgroundColor",
            OptionKey::OpenSelector => "openSelector",
            OptionKey::AutoOpen => "autoOpen",
            OptionKey::CloseSelector => "closeSelector",
            OptionKey::ShowCloseButton => "showCloseButton",
            OptionKey::AnimationDuration => "animationDuration",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SettingsError::UnknownOption(s.to_string()))
    }
}

/// A single option value as exchanged with callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whole, non-negative milliseconds that fit a `u32`.
    pub fn as_millis(&self) -> Option<u32> {
        match self {
            OptionValue::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX) => {
                Some(*n as u32)
            }
            // "300" is accepted the way parseInt would accept it
            OptionValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn into_selector(self) -> Option<Option<String>> {
        match self {
            OptionValue::Null => Some(None),
            OptionValue::Text(s) if s.trim().is_empty() => Some(None),
            OptionValue::Text(s) => Some(Some(s)),
            _ => None,
        }
    }
}

impl From<Option<String>> for OptionValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(OptionValue::Null, OptionValue::Text)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Number(f64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ModalSettings::default();
        assert_eq!(settings.background_color, "#fff");
        assert_eq!(settings.open_selector, None);
        assert!(!settings.auto_open);
        assert_eq!(settings.close_selector.as_deref(), Some(".close-modal"));
        assert!(settings.show_close_button);
        assert_eq!(settings.animation_duration, 200);
    }

    #[test]
    fn test_from_json_overlays_defaults() {
        let settings =
            ModalSettings::from_json(r##"{"backgroundColor":"#000","animationDuration":350}"##)
                .unwrap();
        assert_eq!(settings.background_color, "#000");
        assert_eq!(settings.animation_duration, 350);
        assert_eq!(settings.close_selector.as_deref(), Some(".close-modal"));
    }

    #[test]
    fn test_null_selector_clears_it() {
        let settings = ModalSettings::from_json(r#"{"closeSelector":null}"#).unwrap();
        assert_eq!(settings.close_selector, None);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = ModalSettings::from_json(r#"{"colour":"red"}"#).unwrap_err();
        assert!(matches!(err, SettingsError::Malformed(_)));
    }

    #[test]
    fn test_set_checks_types() {
        let mut settings = ModalSettings::default();
        settings
            .set(OptionKey::AnimationDuration, OptionValue::Number(500.0))
            .unwrap();
        assert_eq!(settings.animation_duration, 500);

        let err = settings
            .set(OptionKey::AnimationDuration, OptionValue::Number(-1.0))
            .unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidValue {
                key: OptionKey::AnimationDuration,
                expected: "a non-negative integer"
            }
        );

        assert!(settings.set(OptionKey::AutoOpen, "yes".into()).is_err());
        settings.set(OptionKey::OpenSelector, ".trigger".into()).unwrap();
        assert_eq!(settings.get(OptionKey::OpenSelector), OptionValue::Text(".trigger".into()));
    }

    #[test]
    fn test_duration_accepts_numeric_text() {
        assert_eq!(OptionValue::from("300").as_millis(), Some(300));
        assert_eq!(OptionValue::Number(12.5).as_millis(), None);
    }

    #[test]
    fn test_option_key_names() {
        for key in OptionKey::ALL {
            assert_eq!(key.as_str().parse::<OptionKey>().unwrap(), key);
        }
        assert!("_private".parse::<OptionKey>().is_err());
    }

    #[test]
    fn test_patch_keys() {
        let patch = SettingsPatch::from_json(r#"{"autoOpen":true,"openSelector":null}"#).unwrap();
        assert_eq!(patch.keys(), vec![OptionKey::OpenSelector, OptionKey::AutoOpen]);
        assert!(SettingsPatch::default().is_empty());
    }
}
