//! Subscriber assembly.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{Config, Format, Writer};
use crate::error::{LogError, LogResult};

type FilterLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Builds and installs the global subscriber.
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Keeps logger resources alive. Hold it for the life of the program.
#[derive(Debug)]
#[must_use = "dropping the guard loses the reload handle"]
pub struct LoggerGuard {
    reload: Option<ReloadHandle>,
}

impl LoggerGuard {
    /// Handle for changing the filter, when the config was reloadable.
    pub fn reload_handle(&self) -> Option<&ReloadHandle> {
        self.reload.as_ref()
    }

    pub(crate) fn noop() -> Self {
        Self { reload: None }
    }
}

/// Changes the filter of a running logger.
#[derive(Clone)]
pub struct ReloadHandle {
    filter: tracing_subscriber::reload::Handle<EnvFilter, Registry>,
    current: Arc<ArcSwap<String>>,
}

impl ReloadHandle {
    /// Replace the filter directives.
    pub fn reload(&self, directives: &str) -> LogResult<()> {
        let filter = EnvFilter::try_new(directives).map_err(|e| LogError::filter(directives, e))?;
        self.filter
            .reload(filter)
            .map_err(|e| LogError::Config(format!("failed to reload filter: {e}")))?;
        self.current.store(Arc::new(directives.to_owned()));
        tracing::info!(filter = directives, "log filter reloaded");
        Ok(())
    }

    /// Directives currently in effect.
    pub fn current_filter(&self) -> Arc<String> {
        self.current.load_full()
    }
}

impl std::fmt::Debug for ReloadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadHandle")
            .field("current", &self.current.load())
            .finish_non_exhaustive()
    }
}

macro_rules! fmt_layer {
    ($style:ident, $display:expr, $writer:expr) => {
        tracing_subscriber::fmt::layer()
            .$style()
            .with_writer($writer)
            .with_ansi($display.colors)
            .with_target($display.target)
            .with_file($display.source)
            .with_line_number($display.source)
            .with_thread_ids($display.thread_ids)
    };
}

impl LoggerBuilder {
    /// Builder for `config`.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Install the subscriber.
    ///
    /// Fails if the filter does not parse or a global subscriber is
    /// already set.
    pub fn build(self) -> LogResult<LoggerGuard> {
        let Config {
            level,
            format,
            writer,
            display,
            reloadable,
        } = self.config;

        let filter = EnvFilter::try_new(&level).map_err(|e| LogError::filter(&level, e))?;
        let (filter_layer, reload) = filter_layer(filter, &level, reloadable);
        let writer = match writer {
            Writer::Stderr => BoxMakeWriter::new(std::io::stderr),
            Writer::Stdout => BoxMakeWriter::new(std::io::stdout),
        };

        let installed = match format {
            Format::Pretty => Registry::default()
                .with(filter_layer)
                .with(fmt_layer!(pretty, display, writer))
                .try_init(),
            Format::Compact => Registry::default()
                .with(filter_layer)
                .with(fmt_layer!(compact, display, writer))
                .try_init(),
            Format::Json => Registry::default()
                .with(filter_layer)
                .with(
                    fmt_layer!(json, display, writer)
                        .flatten_event(display.flatten)
                        .with_current_span(true),
                )
                .try_init(),
        };
        installed.map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

        tracing::debug!(filter = %level, ?format, reloadable, "logger initialized");
        Ok(LoggerGuard { reload })
    }
}

fn filter_layer(filter: EnvFilter, directives: &str, reloadable: bool) -> (FilterLayer, Option<ReloadHandle>) {
    if reloadable {
        let (layer, handle) = tracing_subscriber::reload::Layer::new(filter);
        let reload = ReloadHandle {
            filter: handle,
            current: Arc::new(ArcSwap::from_pointee(directives.to_owned())),
        };
        (Box::new(layer), Some(reload))
    } else {
        (Box::new(filter), None)
    }
}
