#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the crime cluster CLI.
//!
//! [`FetchSpinner`] draws an incident fetch (request, decode, result count)
//! through the source crate's [`ProgressCallback`]. [`init_logger`] wires
//! `pretty_env_logger` through `indicatif-log-bridge` so log lines print
//! above the spinner instead of tearing it.

use std::sync::Arc;
use std::time::Duration;

use crime_cluster_source::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

pub use indicatif::MultiProgress;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {prefix:.bold} {wide_msg} [{elapsed}]";
const DONE_TEMPLATE: &str = "{prefix:.bold} {msg} in {elapsed}";

/// Log level used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Spinner for one incident fetch. The feed does not report a size up
/// front, so there is no bar to fill.
pub struct FetchSpinner {
    bar: ProgressBar,
}

impl FetchSpinner {
    /// Adds a spinner labelled with the source's name to `multi`.
    #[must_use]
    pub fn start(multi: &MultiProgress, source_name: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(style(SPINNER_TEMPLATE));
        bar.set_prefix(source_name.to_string());
        bar.set_message("connecting");
        bar.enable_steady_tick(Duration::from_millis(120));

        Arc::new(Self { bar })
    }
}

impl ProgressCallback for FetchSpinner {
    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.set_style(style(DONE_TEMPLATE));
        self.bar.finish_with_message(msg);
    }

    fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Installs the global logger behind `indicatif-log-bridge` and returns the
/// [`MultiProgress`] every spinner must be added to.
///
/// `RUST_LOG` overrides [`DEFAULT_LOG_LEVEL`]. A logger that is already
/// installed (tests, embedding) is left in place.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(DEFAULT_LOG_LEVEL)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}
