//! Turning a pasted playlist link into an embeddable player URL.

use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistEmbed {
    /// Spotify playlist id.
    Spotify(String),
    /// YouTube (or YouTube Music) playlist id.
    YouTubePlaylist(String),
    /// Single YouTube video id.
    YouTubeVideo(String),
}

impl PlaylistEmbed {
    pub fn embed_url(&self) -> String {
        match self {
            Self::Spotify(id) => {
                format!("https://open.spotify.com/embed/playlist/{id}?utm_source=generator")
            }
            Self::YouTubePlaylist(list) => {
                format!("https://www.youtube.com/embed/videoseries?list={list}")
            }
            Self::YouTubeVideo(id) => format!("https://www.youtube.com/embed/{id}"),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Spotify(_) => "Spotify Playlist Embed",
            Self::YouTubePlaylist(_) => "YouTube Playlist Player",
            Self::YouTubeVideo(_) => "YouTube Video Player",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbedError {
    #[error("Ocorreu um erro ao carregar a playlist. Verifique o link.")]
    InvalidUrl,

    #[error("Link do Spotify inválido.")]
    InvalidSpotifyLink,

    #[error("Link do YouTube inválido ou não é um vídeo/playlist.")]
    InvalidYouTubeLink,

    #[error("Link da playlist não suportado. Use Spotify ou YouTube.")]
    Unsupported,
}

pub fn resolve_embed(link: &str) -> Result<PlaylistEmbed, EmbedError> {
    let url = Url::parse(link.trim()).map_err(|_| EmbedError::InvalidUrl)?;

    match url.host_str() {
        Some("open.spotify.com") if url.path().contains("/playlist/") => {
            let id = url
                .path()
                .split("/playlist/")
                .nth(1)
                .and_then(|rest| rest.split('/').next())
                .filter(|id| !id.is_empty())
                .ok_or(EmbedError::InvalidSpotifyLink)?;
            Ok(PlaylistEmbed::Spotify(id.to_string()))
        }
        Some(host @ ("www.youtube.com" | "music.youtube.com" | "youtu.be")) => {
            let query = |name: &str| {
                url.query_pairs()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.into_owned())
                    .filter(|v| !v.is_empty())
            };

            let video = if host == "youtu.be" {
                Some(url.path().trim_start_matches('/').to_string()).filter(|id| !id.is_empty())
            } else {
                query("v")
            };

            match (query("list"), video) {
                (Some(list), _) => Ok(PlaylistEmbed::YouTubePlaylist(list)),
                (None, Some(video)) => Ok(PlaylistEmbed::YouTubeVideo(video)),
                (None, None) => Err(EmbedError::InvalidYouTubeLink),
            }
        }
        _ => Err(EmbedError::Unsupported),
    }
}
