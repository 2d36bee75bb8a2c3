use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILE: &str = "autoevaluator_debug.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

lazy_static::lazy_static! {
    static ref ACTIVE: Mutex<Option<LogTarget>> = Mutex::new(None);
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "autoevaluator=debug"
        } else {
            "autoevaluator=info"
        })
    })
}

/// Installs the global tracing subscriber once; later calls are no-ops.
///
/// File output is appended without ANSI colours.
pub fn init(target: LogTarget, verbose: bool) -> io::Result<()> {
    let mut active = ACTIVE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if active.is_some() {
        return Ok(());
    }

    let installed = match &target {
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter(verbose))
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter(verbose))
            .with_writer(io::stderr)
            .try_init(),
    };

    // A host application may already own the global subscriber.
    if let Err(e) = installed {
        return Err(io::Error::other(format!("logger already installed: {}", e)));
    }

    *active = Some(target);
    Ok(())
}

pub fn active_target() -> Option<LogTarget> {
    ACTIVE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}
