//! The `run` flow: bind the server's life to one target application.
//!
//! Resolve the app spec → attach or launch → pick a port → emit the
//! bootstrap record on stdout → watch the target's liveness → serve until
//! `/quit`, signal, or target exit.

use crate::server::{AppState, Server};
use marionette::{AppInfo, AppSpec, AutomationError, PlatformHandle, TargetApp};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long a freshly launched application gets to show up in the process
/// table.
const LAUNCH_WAIT: Duration = Duration::from_secs(5);
const LAUNCH_POLL: Duration = Duration::from_millis(250);
const WATCHDOG_POLL: Duration = Duration::from_secs(1);

/// The machine-readable contract with callers: exactly one line on stdout,
/// flushed immediately. Field order is part of the contract.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BootstrapRecord {
    pub app: String,
    pub host: String,
    pub pid: i32,
    pub port: u16,
}

impl BootstrapRecord {
    pub fn emit(&self) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer(&mut stdout, self)?;
        stdout.write_all(b"\n")?;
        stdout.flush()
    }
}

/// The display name an app spec should match in the process table.
fn wanted_name(spec: &AppSpec) -> Option<String> {
    match spec {
        AppSpec::Name(name) => Some(name.clone()),
        AppSpec::Path(path) => Path::new(path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string()),
        AppSpec::BundleId(_) => None,
    }
}

/// First running app matching the spec: by bundle id, or by
/// case-insensitive name (exact first, then substring).
fn find_running(apps: &[AppInfo], spec: &AppSpec) -> Option<AppInfo> {
    if let AppSpec::BundleId(bundle_id) = spec {
        let wanted = bundle_id.to_lowercase();
        return apps
            .iter()
            .find(|app| {
                app.bundle_id
                    .as_deref()
                    .is_some_and(|b| b.to_lowercase() == wanted)
            })
            .cloned();
    }
    let name = wanted_name(spec)?.to_lowercase();
    apps.iter()
        .find(|app| app.name.to_lowercase() == name)
        .or_else(|| {
            apps.iter()
                .find(|app| app.name.to_lowercase().contains(&name))
        })
        .cloned()
}

/// Attach to a running process matching `spec`, launching it first when
/// nothing matches.
pub async fn resolve_target(
    platform: &PlatformHandle,
    spec: &AppSpec,
) -> Result<TargetApp, AutomationError> {
    let apps = platform.call(|p| p.running_apps()).await?;
    if let Some(app) = find_running(&apps, spec) {
        info!("attaching to running app '{}' (pid {})", app.name, app.pid);
        return Ok(TargetApp {
            name: app.name,
            pid: app.pid,
            bundle_id: app.bundle_id,
        });
    }

    info!("launching '{}'", spec.display());
    let launch_spec = spec.clone();
    platform.call(move |p| p.launch(&launch_spec)).await?;

    let deadline = tokio::time::Instant::now() + LAUNCH_WAIT;
    loop {
        tokio::time::sleep(LAUNCH_POLL).await;
        let apps = platform.call(|p| p.running_apps()).await?;
        if let Some(app) = find_running(&apps, spec) {
            info!("launched '{}' (pid {})", app.name, app.pid);
            return Ok(TargetApp {
                name: app.name,
                pid: app.pid,
                bundle_id: app.bundle_id,
            });
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(AutomationError::AppNotFound(format!(
                "'{}' did not become ready within {}s of launch",
                spec.display(),
                LAUNCH_WAIT.as_secs()
            )));
        }
    }
}

/// Poll the target's liveness once per second; when it exits, cancel the
/// server so the process can exit cleanly.
pub fn spawn_watchdog(platform: PlatformHandle, pid: i32, shutdown: CancellationToken) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(WATCHDOG_POLL) => {}
            }
            let alive = platform
                .call(move |p| Ok(p.is_running(pid)))
                .await
                .unwrap_or(false);
            if !alive {
                info!("target app (pid {pid}) exited; shutting down");
                shutdown.cancel();
                return;
            }
            debug!("watchdog: pid {pid} alive");
        }
    });
}

/// The whole `run` flow. Returns when the server has stopped; the caller
/// exits 0 on `Ok`.
pub async fn run(
    platform: PlatformHandle,
    spec: AppSpec,
    host: String,
    port: u16,
) -> anyhow::Result<BootstrapRecord> {
    let target = resolve_target(&platform, &spec).await?;
    let state = AppState::new(platform.clone(), Some(target.clone()));
    let shutdown = state.shutdown.clone();

    let mut server = Server::new(state);
    let addr = server.start(&host, port).await?;

    let record = BootstrapRecord {
        app: target.name.clone(),
        host: host.clone(),
        pid: target.pid,
        port: addr.port(),
    };
    record.emit()?;

    spawn_watchdog(platform, target.pid, shutdown.clone());

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; shutting down");
            signal_shutdown.cancel();
        }
    });

    server.wait().await;
    Ok(record)
}
