/// Search → filter → per-programme details → describe / plan / download.
///
/// A search or detail request the archive refuses is fatal, and every detail
/// request completes before the first programme is described or downloaded.
/// Anything else that goes wrong with a single programme (malformed or
/// incomplete metadata, a failed transfer) is recorded against that programme
/// and the run moves on.
use std::path::PathBuf;

use futures_util::{StreamExt, TryStreamExt, stream};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::{debug, info, trace, warn};

use crate::{
    config::AppConfig,
    download,
    error::{AppError, Result},
    filename,
    filter::filter_programmes,
    models::{FilterCriteria, ProgrammeDetails, RunMode, SearchMode},
    redux::ReduxClient,
};

// ── Report ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ItemOutcome {
    /// `<diskref>: <episode json>`
    Described(String),
    Planned { uri: String, filename: String },
    Downloaded { path: PathBuf, bytes: u64 },
    /// Programme is of another content type (e.g. radio when tv was asked for).
    Skipped { kind: String },
    Failed(AppError),
}

#[derive(Debug)]
pub struct ItemReport {
    pub diskref: String,
    pub outcome: ItemOutcome,
}

/// Per-programme outcomes, earliest programme first.
#[derive(Debug, Default)]
pub struct RunReport {
    pub items: Vec<ItemReport>,
}

impl RunReport {
    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Downloaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { .. }))
    }

    pub fn download_failures(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed(AppError::Download { .. })))
    }

    pub fn lookup_failures(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed(AppError::Lookup { .. })))
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct Pipeline {
    client: ReduxClient,
    output_dir: PathBuf,
    max_concurrent: usize,
    /// `None` when progress display is suppressed.
    progress: Option<MultiProgress>,
}

impl Pipeline {
    pub fn new(client: ReduxClient, config: &AppConfig, show_progress: bool) -> Self {
        Self {
            client,
            output_dir: PathBuf::from(&config.output_dir),
            max_concurrent: config.max_concurrent.max(1),
            progress: show_progress.then(MultiProgress::new),
        }
    }

    pub async fn run(
        &self,
        search: &SearchMode,
        criteria: &FilterCriteria,
        mode: &RunMode,
    ) -> Result<RunReport> {
        self.run_with(search, criteria, mode, |_| {}).await
    }

    /// Like [`Pipeline::run`], calling `on_item` as each programme finishes, in
    /// report order.
    pub async fn run_with<F>(
        &self,
        search: &SearchMode,
        criteria: &FilterCriteria,
        mode: &RunMode,
        mut on_item: F,
    ) -> Result<RunReport>
    where
        F: FnMut(&ItemReport),
    {
        let results = self.client.search(search).await?;
        let diskrefs = filter_programmes(&results, criteria);
        info!(
            "{} of {} search result(s) match the filters",
            diskrefs.len(),
            results.len()
        );
        debug!("Selected programmes: {diskrefs:?}");

        // All details are in before anything is printed or written, so a
        // refused detail request leaves no output behind at any concurrency.
        let fetched: Vec<_> = stream::iter(diskrefs)
            .map(|diskref| self.details(diskref))
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        let mut report = RunReport::default();
        let mut items = std::pin::pin!(
            stream::iter(fetched)
                .map(|(diskref, details)| self.process(diskref, details, mode))
                .buffered(self.max_concurrent)
        );

        while let Some(item) = items.next().await {
            on_item(&item);
            report.items.push(item);
        }

        Ok(report)
    }

    /// The outer error aborts the run. A body that arrives but does not match
    /// the programme schema only spoils this programme.
    async fn details(&self, diskref: String) -> Result<(String, Result<ProgrammeDetails>)> {
        match self.client.programme_details(&diskref).await {
            Ok(details) => Ok((diskref, Ok(details))),
            Err(AppError::Json(e)) => {
                let err = AppError::lookup(&diskref, format!("malformed metadata: {e}"));
                Ok((diskref, Err(err)))
            }
            Err(e) => Err(e),
        }
    }

    async fn process(
        &self,
        diskref: String,
        details: Result<ProgrammeDetails>,
        mode: &RunMode,
    ) -> ItemReport {
        let outcome = match details {
            Ok(details) => self.handle(&diskref, &details, mode).await,
            Err(e) => Err(e),
        };
        let outcome = outcome.unwrap_or_else(|e| {
            warn!("{diskref}: {e}");
            ItemOutcome::Failed(e)
        });

        ItemReport { diskref, outcome }
    }

    async fn handle(
        &self,
        diskref: &str,
        details: &ProgrammeDetails,
        mode: &RunMode,
    ) -> Result<ItemOutcome> {
        match mode {
            RunMode::Describe => Ok(ItemOutcome::Described(describe(diskref, details)?)),
            RunMode::Plan {
                content_type,
                media_key,
            }
            | RunMode::Download {
                content_type,
                media_key,
            } => {
                if details.kind != content_type.as_str() {
                    info!(
                        "Skipping {diskref}: it is {:?}, not {content_type}",
                        details.kind
                    );
                    return Ok(ItemOutcome::Skipped {
                        kind: details.kind.clone(),
                    });
                }
                let dry_run = matches!(mode, RunMode::Plan { .. });
                self.fetch(details, media_key, dry_run).await
            }
        }
    }

    async fn fetch(
        &self,
        details: &ProgrammeDetails,
        media_key: &str,
        dry_run: bool,
    ) -> Result<ItemOutcome> {
        let filename = filename::compose(details, media_key)?;
        let uri = details.media_variant(media_key)?.uri.clone();

        if dry_run {
            return Ok(ItemOutcome::Planned { uri, filename });
        }

        info!("{uri} downloading as {filename}");
        let path = self.output_dir.join(&filename);
        let bar = self.progress_bar(&filename);

        let result = download::fetch_to_file(self.client.http(), &uri, &path, |p| {
            if let Some(total) = p.total_size {
                bar.set_length(total);
            }
            bar.inc(p.chunk_size);
            if let Some(pct) = p.percent() {
                trace!("{filename}: {pct:.1}%");
            }
        })
        .await;

        match result {
            Ok(bytes) => {
                bar.finish_and_clear();
                Ok(ItemOutcome::Downloaded { path, bytes })
            }
            Err(e) => {
                bar.abandon();
                Err(e)
            }
        }
    }

    fn progress_bar(&self, label: &str) -> ProgressBar {
        let Some(multi) = &self.progress else {
            return ProgressBar::hidden();
        };
        let bar = multi.add(ProgressBar::new(0));
        let style = ProgressStyle::with_template(
            "{msg} {bar:30} {percent:>3}% {bytes}/{total_bytes} {bytes_per_sec}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(label.to_string());
        bar
    }
}

fn describe(diskref: &str, details: &ProgrammeDetails) -> Result<String> {
    Ok(format!(
        "{diskref}: {}",
        serde_json::to_string(&details.episode)?
    ))
}
