use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Parser};

use crate::{
    config::AppConfig,
    models::{ContentType, FilterCriteria, Ordinal, RunMode, SearchMode},
};

/// Download all programmes matching a show name or a full-text search.
#[derive(Debug, Parser)]
#[command(name = "redux-dl", version, about)]
#[command(group(ArgGroup::new("query").required(true).args(["show", "full_text"])))]
pub struct Cli {
    /// Name of the show to download
    #[arg(short = 's', long)]
    pub show: Option<String>,

    /// Full-text search to download
    #[arg(short = 'f', long = "full-text")]
    pub full_text: Option<String>,

    /// Media type to download, e.g. mp3, mp4-hi
    #[arg(short = 'm', long)]
    pub media: Option<String>,

    /// Type of programme: tv or radio
    #[arg(short = 't', long = "type", default_value = "tv")]
    pub content_type: ContentType,

    /// Only programmes broadcast on this date (YYYY-MM-DD)
    #[arg(short = 'z', long, value_parser = parse_date)]
    pub date: Option<String>,

    /// Only programmes on this channel, e.g. bbcone
    #[arg(short = 'b', long)]
    pub channel: Option<String>,

    /// Only programmes from this series number
    #[arg(short = 'r', long)]
    pub series: Option<u32>,

    /// List matching programmes instead of downloading them
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Verbose logging; print media URLs and filenames without downloading
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Hide download progress
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Config file [default: ~/.get_redux.cfg]
    #[arg(short = 'c', long = "config")]
    pub config_file: Option<PathBuf>,

    /// Directory to save downloads in (overrides config)
    #[arg(short = 'o', long)]
    pub output_dir: Option<String>,

    /// Programmes to process at once (overrides config)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,
}

fn parse_date(s: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

impl Cli {
    pub fn search_mode(&self) -> SearchMode {
        match (&self.show, &self.full_text) {
            (Some(show), _) => SearchMode::ShowTitle(show.clone()),
            (None, Some(text)) => SearchMode::FullText(text.clone()),
            (None, None) => unreachable!("the \"query\" group requires --show or --full-text"),
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            date: self.date.clone(),
            channel: self.channel.clone(),
            series_position: self.series.map(Ordinal),
        }
    }

    pub fn run_mode(&self, config: &AppConfig) -> RunMode {
        if self.list {
            return RunMode::Describe;
        }
        let content_type = self.content_type;
        let media_key = self
            .media
            .clone()
            .unwrap_or_else(|| config.media_key_for(content_type));
        if self.debug {
            RunMode::Plan {
                content_type,
                media_key,
            }
        } else {
            RunMode::Download {
                content_type,
                media_key,
            }
        }
    }

    /// Apply command-line overrides to the loaded config.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(jobs) = self.jobs {
            config.max_concurrent = jobs.max(1);
        }
    }
}
