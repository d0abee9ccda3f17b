//! Subcommand execution

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::json;
use tokio::sync::watch;

use registry_lock_app::adapters::SqliteStore;
use registry_lock_app::config::AppConfig;
use registry_lock_app::AppState;
use registry_lock_core::types::{Actor, LockAction, LockRequest};

use crate::cli::{ActorArgs, Command, RequestArgs};
use crate::fixtures;

impl ActorArgs {
    fn actor(&self) -> Actor {
        if self.admin {
            Actor::admin(&self.email)
        } else {
            Actor::user(&self.email)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run(
    command: Command,
    config: &AppConfig,
    state: &AppState,
    store: &Arc<SqliteStore>,
) -> Result<()> {
    match command {
        Command::LoadFixtures { file } => {
            let summary = fixtures::load_file(
                &file,
                state.ctx.registrar_repository(),
                state.ctx.domain_repository(),
            )
            .await?;
            tracing::info!(
                "Loaded {} registrars and {} domains",
                summary.registrars,
                summary.domains
            );
            print_json(&summary)
        }

        Command::Lock { domains, client } => {
            bulk(state, &domains, client.as_deref(), LockAction::Lock, None).await
        }

        Command::Unlock {
            domains,
            client,
            relock_after,
        } => {
            let relock = relock_after.map(Duration::from_secs);
            bulk(state, &domains, client.as_deref(), LockAction::Unlock, relock).await
        }

        Command::Request(args) => request(state, args).await,

        Command::Verify { actor, code } => {
            let outcome = state
                .lock_request_service
                .verify(&actor.actor(), &code)
                .await?;
            print_json(&outcome)
        }

        Command::Status { domain } => {
            let status = state
                .domain_lock_service
                .lock_status(&domain.to_ascii_lowercase())
                .await?;
            print_json(&json!({ "domainName": domain, "status": status }))
        }

        Command::Locks { actor, registrar } => {
            let overview = state
                .lock_request_service
                .locks_overview(&actor.actor(), &registrar)
                .await?;
            print_json(&overview)
        }

        Command::Relock { revision_id } => {
            let outcome = state.relock_service.relock(revision_id).await?;
            print_json(&outcome)
        }

        Command::Sweep => {
            let result = state.run_relock_sweep().await?;
            print_json(&result)
        }

        Command::Worker { interval } => {
            let interval = interval.map_or_else(
                || config.relock_worker.interval(),
                |secs| Duration::from_secs(secs.max(1)),
            );
            worker(state, interval).await
        }

        Command::History { domain } => history(state, &domain.to_ascii_lowercase()).await,

        Command::Outbox { mark_sent } => {
            let pending = store.pending_emails().await?;
            print_json(&pending)?;
            if mark_sent {
                let ids: Vec<i64> = pending.iter().map(|e| e.id).collect();
                let marked = store.mark_emails_sent(&ids, chrono::Utc::now()).await?;
                tracing::info!("Marked {marked} emails as sent");
            }
            Ok(())
        }
    }
}

async fn bulk(
    state: &AppState,
    domains: &[String],
    client: Option<&str>,
    action: LockAction,
    relock: Option<Duration>,
) -> Result<()> {
    let domains: Vec<String> = domains.iter().map(|d| d.to_ascii_lowercase()).collect();
    let result = state
        .domain_lock_service
        .bulk_apply(&domains, client, action, relock)
        .await?;
    print_json(&result)?;

    if result.failed_count > 0 {
        bail!(
            "Failed to {} {} of {} domains",
            action.verb(),
            result.failed_count,
            domains.len()
        );
    }
    Ok(())
}

async fn request(state: &AppState, args: RequestArgs) -> Result<()> {
    let request = LockRequest {
        registrar_id: args.registrar,
        domain_name: args.domain,
        is_lock: !args.unlock,
        password: args.password,
        relock_duration: args.relock_after.map(Duration::from_secs),
    };

    let lock = state
        .lock_request_service
        .submit(&args.actor.actor(), request)
        .await?;
    tracing::info!(
        "Created pending {} for {}; verification email sent",
        lock.action.verb(),
        lock.domain_name
    );
    print_json(&lock)
}

async fn history(state: &AppState, domain_name: &str) -> Result<()> {
    let domain = state
        .ctx
        .domain_repository()
        .find_by_name(domain_name)
        .await?
        .with_context(|| format!("Unknown domain {domain_name}"))?;

    let audit = state.ctx.audit_repository();
    let history = audit.find_history_by_repo_id(&domain.repo_id).await?;
    let billing = audit.find_billing_events_by_target(&domain.domain_name).await?;

    print_json(&json!({
        "domain": domain,
        "history": history,
        "billingEvents": billing,
    }))
}

async fn worker(state: &AppState, interval: Duration) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = state.spawn_relock_worker(interval, shutdown_rx);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutting down relock worker");

    // The worker also stops when every sender is gone
    let _ = shutdown_tx.send(true);
    handle.await.context("Relock worker panicked")?;
    Ok(())
}
