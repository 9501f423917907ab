//! Render models for the two display surfaces.
//!
//! Both are built from a [`Preferences`] snapshot and rendered as plain
//! text by their `Display` impls.

use std::fmt;

use amor_shared::constants::APP_NAME;
use amor_shared::{NameDisplayPreference, Preferences, Theme};
use chrono::{Datelike, NaiveDateTime};

use crate::anniversary::anniversary_text;
use crate::controller::Phase;
use crate::playlist::{resolve_embed, EmbedError, PlaylistEmbed};

/// Page heading according to the couple's display preference.
pub fn heading(preferences: &Preferences) -> String {
    let [first, second] = &preferences.couple_names;
    match preferences.name_display_preference {
        NameDisplayPreference::Both => format!("{first} & {second}"),
        NameDisplayPreference::User1 => format!("{first} ♥"),
        NameDisplayPreference::User2 => format!("{second} ♥"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPage {
    pub theme: Theme,
    pub heading: String,
    pub anniversary: String,
    /// `None` when no playlist is configured.
    pub playlist: Option<Result<PlaylistEmbed, EmbedError>>,
    /// `None` when the phrase is blank.
    pub defining_phrase: Option<String>,
    /// Nothing configured beyond names and theme.
    pub is_empty: bool,
    pub year: i32,
}

impl PublicPage {
    pub fn new(preferences: &Preferences, now: NaiveDateTime) -> Self {
        let playlist = preferences
            .playlist_url
            .as_deref()
            .filter(|url| !url.trim().is_empty());
        let anniversary = preferences
            .anniversary_date
            .as_deref()
            .filter(|date| !date.trim().is_empty());
        let defining_phrase = Some(preferences.defining_phrase.trim())
            .filter(|phrase| !phrase.is_empty())
            .map(str::to_string);

        Self {
            theme: preferences.theme,
            heading: heading(preferences),
            anniversary: anniversary_text(anniversary, now),
            playlist: playlist.map(resolve_embed),
            is_empty: playlist.is_none() && anniversary.is_none() && defining_phrase.is_none(),
            defining_phrase,
            year: now.year(),
        }
    }
}

impl fmt::Display for PublicPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        writeln!(f)?;
        writeln!(f, "{}", self.anniversary)?;

        match &self.playlist {
            Some(Ok(embed)) => {
                writeln!(f)?;
                writeln!(f, "Nossa Trilha Sonora")?;
                writeln!(f, "  {}: {}", embed.title(), embed.embed_url())?;
            }
            Some(Err(e)) => {
                writeln!(f)?;
                writeln!(f, "Nossa Trilha Sonora")?;
                writeln!(f, "  {e}")?;
            }
            None => {}
        }

        if let Some(phrase) = &self.defining_phrase {
            writeln!(f)?;
            writeln!(f, "Uma frase que nos define")?;
            writeln!(f, "  \"{phrase}\"")?;
        }

        if self.is_empty {
            writeln!(f)?;
            writeln!(f, "Seu espaço está um pouco vazio...")?;
            writeln!(f, "Acesse o dashboard para adicionar suas memórias!")?;
        }

        writeln!(f)?;
        write!(f, "{APP_NAME} © {} · tema {}", self.year, self.theme)
    }
}

/// Current values of every editable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub preferences: Preferences,
    pub phase: Phase,
}

impl DashboardView {
    pub fn new(preferences: Preferences, phase: Phase) -> Self {
        Self { preferences, phase }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.preferences;
        let unset = "(não definido)";

        writeln!(f, "Dashboard · {APP_NAME}")?;
        writeln!(f, "  Estado:               {:?}", self.phase)?;
        writeln!(
            f,
            "  Data do aniversário:  {}",
            p.anniversary_date.as_deref().unwrap_or(unset)
        )?;
        writeln!(
            f,
            "  Playlist:             {}",
            p.playlist_url.as_deref().unwrap_or(unset)
        )?;
        writeln!(
            f,
            "  Frase:                {}",
            if p.defining_phrase.is_empty() { unset } else { p.defining_phrase.as_str() }
        )?;
        writeln!(
            f,
            "  Nomes:                {} / {}",
            p.couple_names[0], p.couple_names[1]
        )?;
        writeln!(f, "  Exibição dos nomes:   {}", p.name_display_preference)?;
        write!(f, "  Tema:                 {}", p.theme)
    }
}
