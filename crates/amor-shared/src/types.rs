use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::DEFAULT_COUPLE_NAMES;
use crate::error::{UnknownVariant, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn opposite(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(UnknownVariant {
                kind: "theme",
                value: other.to_string(),
            }),
        }
    }
}

/// Which of the couple's names the public page heading shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameDisplayPreference {
    #[default]
    Both,
    User1,
    User2,
}

impl NameDisplayPreference {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::User1 => "user1",
            Self::User2 => "user2",
        }
    }
}

impl fmt::Display for NameDisplayPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NameDisplayPreference {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(Self::Both),
            "user1" => Ok(Self::User1),
            "user2" => Ok(Self::User2),
            other => Err(UnknownVariant {
                kind: "nameDisplayPreference",
                value: other.to_string(),
            }),
        }
    }
}

pub fn default_couple_names() -> [String; 2] {
    DEFAULT_COUPLE_NAMES.map(String::from)
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// The single canonical preferences document.
///
/// Every field always carries a value; "no value" is expressed with `None`
/// (serialized as `null`) or the empty phrase, never by omitting the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// ISO-8601 date or timestamp, kept verbatim as the couple entered it.
    pub anniversary_date: Option<String>,
    pub playlist_url: Option<String>,
    /// Empty string means no phrase.
    pub defining_phrase: String,
    pub couple_names: [String; 2],
    pub name_display_preference: NameDisplayPreference,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            anniversary_date: None,
            playlist_url: None,
            defining_phrase: String::new(),
            couple_names: default_couple_names(),
            name_display_preference: NameDisplayPreference::default(),
            theme: Theme::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Partial documents
// ---------------------------------------------------------------------------

/// A closed-value field as it arrived on the wire.
///
/// Values outside the closed set are kept as raw JSON so the merge can
/// substitute the default instead of rejecting the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue<T> {
    Valid(T),
    Invalid(serde_json::Value),
}

/// A sparse preferences document.
///
/// Each field is tri-state: `None` means absent (leave unchanged),
/// `Some(None)` / `Some(FieldValue::Invalid(null))` means the caller sent an
/// explicit `null`, anything else is a value. Used both for merge-write
/// payloads and for reading back a stored document that may lack fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialPreferences {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub anniversary_date: Option<Option<String>>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub playlist_url: Option<Option<String>>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub defining_phrase: Option<Option<String>>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub couple_names: Option<FieldValue<Vec<String>>>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name_display_preference: Option<FieldValue<NameDisplayPreference>>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub theme: Option<FieldValue<Theme>>,
}

/// Maps a present field (including an explicit `null`) to `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl PartialPreferences {
    /// Decode a merge-write request body.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, ValidationError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ValidationError::Empty);
        }

        let value: serde_json::Value = serde_json::from_slice(body)?;
        match value.as_object() {
            None => return Err(ValidationError::NotAnObject),
            Some(map) if map.is_empty() => return Err(ValidationError::Empty),
            Some(_) => {}
        }

        let partial: Self = serde_json::from_value(value)?;
        if partial.is_empty() {
            return Err(ValidationError::NoKnownFields);
        }
        Ok(partial)
    }

    pub fn is_empty(&self) -> bool {
        self.anniversary_date.is_none()
            && self.playlist_url.is_none()
            && self.defining_phrase.is_none()
            && self.couple_names.is_none()
            && self.name_display_preference.is_none()
            && self.theme.is_none()
    }

    pub fn anniversary_date(mut self, date: Option<String>) -> Self {
        self.anniversary_date = Some(date);
        self
    }

    pub fn playlist_url(mut self, url: Option<String>) -> Self {
        self.playlist_url = Some(url);
        self
    }

    pub fn defining_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.defining_phrase = Some(Some(phrase.into()));
        self
    }

    pub fn couple_names(mut self, names: [String; 2]) -> Self {
        self.couple_names = Some(FieldValue::Valid(names.into()));
        self
    }

    pub fn name_display_preference(mut self, preference: NameDisplayPreference) -> Self {
        self.name_display_preference = Some(FieldValue::Valid(preference));
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(FieldValue::Valid(theme));
        self
    }
}

impl From<&Preferences> for PartialPreferences {
    fn from(prefs: &Preferences) -> Self {
        Self::default()
            .anniversary_date(prefs.anniversary_date.clone())
            .playlist_url(prefs.playlist_url.clone())
            .defining_phrase(prefs.defining_phrase.clone())
            .couple_names(prefs.couple_names.clone())
            .name_display_preference(prefs.name_display_preference)
            .theme(prefs.theme)
    }
}
