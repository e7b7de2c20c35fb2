//! # Termination signals for a long-running workbench.
//!
//! [`Workbench::run_until_signal`](crate::Workbench::run_until_signal) parks on
//! [`wait_for_shutdown_signal`] and then runs the normal shutdown sequence
//! (`ClosingWorkspace`, task cancellation, grace wait, broker drain). The
//! returned name ends up in the shutdown log line.
//!
//! | Platform | Signals                          |
//! |----------|----------------------------------|
//! | unix     | `SIGINT`, `SIGTERM`, `SIGQUIT`   |
//! | other    | Ctrl-C                           |

/// Waits for the first termination signal and returns its name.
///
/// `Err` if the listeners cannot be installed.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = quit.recv() => "SIGQUIT",
    };
    Ok(name)
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
