use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

// ── Ordinal ──────────────────────────────────────────────────────────────────

/// Series or episode position. The archive sends these as numbers, but older
/// records carry them as numeric strings, so both are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Ordinal(pub u32);

impl<'de> Deserialize<'de> for Ordinal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Ordinal(n)),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map(Ordinal)
                .map_err(|_| serde::de::Error::custom(format!("invalid position: {s:?}"))),
        }
    }
}

impl std::fmt::Display for Ordinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Search results ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// One entry of a search response.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchResult {
    pub diskref: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub series: Option<SeriesRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeriesRef {
    #[serde(default, deserialize_with = "lenient_position")]
    pub position: Option<Ordinal>,
}

/// Search listings are only used for filtering, so a position that is not a
/// number (e.g. `"Christmas"`) counts as absent instead of failing the page.
fn lenient_position<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Ordinal>, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).ok().flatten())
}

// ── Programme details ────────────────────────────────────────────────────────

/// Full metadata for one programme, as returned by `/programme/<diskref>.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProgrammeDetails {
    pub title: String,
    pub uuid: String,
    #[serde(default)]
    pub episode: Option<Episode>,
    #[serde(default)]
    pub series: Option<Series>,
    #[serde(default)]
    pub media: BTreeMap<String, MediaVariant>,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl ProgrammeDetails {
    /// The rendition offered under `media_key`, or a lookup failure naming what is on offer.
    pub fn media_variant(&self, media_key: &str) -> crate::error::Result<&MediaVariant> {
        self.media.get(media_key).ok_or_else(|| {
            let offered = self.media.keys().cloned().collect::<Vec<_>>().join(", ");
            AppError::lookup(
                &self.uuid,
                format!("no {media_key:?} media (available: {offered})"),
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Episode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Ordinal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Series {
    #[serde(default)]
    pub position: Option<Ordinal>,
    #[serde(default)]
    pub title: Option<String>,
}

/// One downloadable rendition of a programme, keyed by media type ("mp3", "mp4-hi", …).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MediaVariant {
    pub ext: String,
    pub uri: String,
}

// ── Run inputs ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Tv,
    Radio,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Tv => "tv",
            ContentType::Radio => "radio",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tv" => Ok(ContentType::Tv),
            "radio" => Ok(ContentType::Radio),
            other => Err(anyhow::anyhow!("unknown content type: {other}")),
        }
    }
}

/// Which search field the query text is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// Programme name (`pname=`).
    ShowTitle(String),
    /// Free text (`q=`).
    FullText(String),
}

impl SearchMode {
    pub fn query(&self) -> &str {
        match self {
            SearchMode::ShowTitle(q) | SearchMode::FullText(q) => q,
        }
    }
}

/// Exact-match constraints applied to search results. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub date: Option<String>,
    pub channel: Option<String>,
    pub series_position: Option<Ordinal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Print each programme's episode metadata.
    Describe,
    /// Resolve media URI and filename, print them, transfer nothing.
    Plan {
        content_type: ContentType,
        media_key: String,
    },
    /// Download the selected rendition of every matching programme.
    Download {
        content_type: ContentType,
        media_key: String,
    },
}
