/// Canonical output filenames for downloaded programmes.
///
/// `Show_Title_-_Series_02_-_Episode_05_-_Episode_Title.ext`, with the series
/// segment omitted when it repeats the title and the episode title omitted
/// when it is only a generic "Episode N".
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AppError, Result},
    models::ProgrammeDetails,
};

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_GENERIC_EPISODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^episode_[0-9]").unwrap());

const SEGMENT_SEP: &str = "_-_";
const UNKNOWN_EPISODE: &str = "XX";
const SPECIAL_SERIES: &str = "special";

/// Build the output filename for `details` rendered as `media_key`.
///
/// Fails only when the metadata cannot name the file: the media key is not
/// offered, or a series carries neither a position nor a title.
pub fn compose(details: &ProgrammeDetails, media_key: &str) -> Result<String> {
    let programme_title = underscore_whitespace(&details.title);

    let (episode_number, episode_title) = match &details.episode {
        Some(ep) => (
            ep.position
                .map(|p| p.to_string())
                .unwrap_or_else(|| UNKNOWN_EPISODE.to_string()),
            ep.title.as_deref().map(underscore_whitespace).unwrap_or_default(),
        ),
        None => (details.uuid.clone(), String::new()),
    };

    let series_label = match &details.series {
        Some(series) => match (series.position, &series.title) {
            (Some(pos), _) => format!("Series_{}", zero_pad(&pos.to_string(), 2)),
            (None, Some(title)) => title.clone(),
            (None, None) => {
                return Err(AppError::lookup(
                    &details.uuid,
                    "series has neither a position nor a title",
                ));
            }
        },
        None => SPECIAL_SERIES.to_string(),
    };

    let ext = &details.media_variant(media_key)?.ext;

    let mut name = programme_title.clone();
    if programme_title != series_label {
        name.push_str(SEGMENT_SEP);
        name.push_str(&series_label);
    }
    name.push_str(SEGMENT_SEP);
    name.push_str("Episode_");
    name.push_str(&zero_pad(&episode_number, 2));

    if !episode_title.is_empty() && !RE_GENERIC_EPISODE.is_match(&episode_title) {
        name.push_str(SEGMENT_SEP);
        name.push_str(&episode_title);
    }

    name.push('.');
    name.push_str(ext);
    Ok(name)
}

fn underscore_whitespace(s: &str) -> String {
    RE_WHITESPACE.replace_all(s, "_").into_owned()
}

/// Left-fill purely numeric strings with zeros up to `width`. Anything else
/// (a uuid, the "XX" placeholder) is returned unchanged.
fn zero_pad(s: &str, width: usize) -> String {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        format!("{s:0>width$}")
    } else {
        s.to_string()
    }
}
