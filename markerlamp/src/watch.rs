use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchDecision {
    Rerun,
    Continue,
}

/// Polls the candidate report and config files instead of the whole
/// tree; a rerun reparses everything from scratch. The watched set is
/// recomputed every poll so reports and configs that appear later are
/// picked up.
pub fn run_polling_watch_loop(
    poll_interval: Duration,
    verbose: bool,
    mut watched: impl FnMut() -> Vec<PathBuf>,
    mut run_once: impl FnMut() -> i32,
) -> i32 {
    let _initial_exit_code = run_once();
    let mut last_fingerprint = compute_watch_fingerprint(&watched());
    loop {
        std::thread::sleep(poll_interval);
        match watch_decision(&watched(), &mut last_fingerprint) {
            WatchDecision::Continue => {}
            WatchDecision::Rerun => {
                if verbose {
                    eprintln!("markerlamp: watch detected changes, re-running");
                }
                let _ = run_once();
            }
        }
    }
}

pub(crate) fn watch_decision(paths: &[PathBuf], last_fingerprint: &mut u64) -> WatchDecision {
    let next = compute_watch_fingerprint(paths);
    if next == *last_fingerprint {
        WatchDecision::Continue
    } else {
        *last_fingerprint = next;
        WatchDecision::Rerun
    }
}

pub(crate) fn compute_watch_fingerprint(paths: &[PathBuf]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    paths.iter().for_each(|candidate| {
        if let Ok(metadata) = std::fs::metadata(candidate) {
            candidate.to_string_lossy().to_string().hash(&mut hasher);
            metadata.len().hash(&mut hasher);
            if let Ok(modified) = metadata.modified()
                && let Ok(duration) = modified.duration_since(std::time::UNIX_EPOCH)
            {
                duration.as_nanos().hash(&mut hasher);
            }
        }
    });
    hasher.finish()
}
