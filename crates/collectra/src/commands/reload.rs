//! Reload command handlers.

use std::time::Duration;

use collectra_core::DataSourceManager;
use tokio_util::sync::CancellationToken;

use crate::cli::{GlobalOpts, ReloadArgs, ReloadScope};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    manager: &DataSourceManager,
    cfg: &Config,
    args: &ReloadArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if args.watch {
        return watch(manager, args.interval.unwrap_or(cfg.reload_interval_secs), global).await;
    }

    let reloaded = match args.scope {
        ReloadScope::Main => manager.reload_main().await?,
        ReloadScope::ThirdParty => manager.reload_third_data_sources().await?,
        ReloadScope::All => manager.reload_all().await?,
    };
    tracing::info!(count = reloaded.len(), "reload finished");

    let out = output::render_single(
        global.format(),
        &reloaded,
        |keys| {
            if keys.is_empty() {
                "Nothing reloaded".to_owned()
            } else {
                output::success(&format!("Reloaded: {}", keys.join(", ")), global.color_enabled())
            }
        },
        |keys| keys.join("\n"),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Periodic reload until Ctrl-C.
async fn watch(manager: &DataSourceManager, interval_secs: u64, global: &GlobalOpts) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let Some(task) = manager.spawn_reload_task(Duration::from_secs(interval_secs), cancel.clone()) else {
        return Err(CliError::Validation {
            field: "reload_interval_secs".into(),
            reason: "--watch needs an interval above 0 (config or --interval)".into(),
        });
    };

    if !global.quiet {
        let color = global.color_enabled();
        manager.add_reload_callback(
            move |keys| eprintln!("{}", output::success(&format!("Reloaded: {}", keys.join(", ")), color)),
            None,
        );
        eprintln!("Reloading every {interval_secs}s, Ctrl-C to stop");
    }

    let stopped = tokio::signal::ctrl_c().await;
    cancel.cancel();
    task.await.map_err(std::io::Error::other)?;
    stopped?;
    Ok(())
}
