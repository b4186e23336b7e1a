//! Orchestrator: turns gateway events into roster mutations and update
//! requests, and owns the shutdown "Off" pass.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use roster::RosterStore;
use scheduler::DebounceScheduler;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::counters::{ChannelRenamer, TargetTable, UpdateExecutor, shutdown_flush};
use crate::discord::events::GatewayEvent;
use crate::error::AppError;
use crate::metrics::counters::Counters;

pub struct App<R: ChannelRenamer> {
    guild_id: String,
    roster: RosterStore,
    targets: Arc<TargetTable>,
    scheduler: DebounceScheduler<UpdateExecutor<R>>,
    renamer: Arc<R>,
    shutdown_timeout: Duration,
    counters: Counters,
}

impl<R: ChannelRenamer> App<R> {
    pub fn new(cfg: &AppConfig, renamer: Arc<R>) -> Self {
        let roster = RosterStore::new();
        let targets = Arc::new(TargetTable::from_config(cfg));
        let counters = Counters::default();

        let executor = UpdateExecutor::new(
            roster.clone(),
            targets.clone(),
            renamer.clone(),
            cfg.rename_timeout,
            counters.clone(),
        );

        Self {
            guild_id: cfg.server.clone(),
            roster,
            targets,
            scheduler: DebounceScheduler::new(cfg.scheduler, Arc::new(executor)),
            renamer,
            shutdown_timeout: cfg.shutdown_timeout,
            counters,
        }
    }

    pub fn roster(&self) -> &RosterStore {
        &self.roster
    }

    pub fn targets(&self) -> &TargetTable {
        &self.targets
    }

    pub fn scheduler(&self) -> &DebounceScheduler<UpdateExecutor<R>> {
        &self.scheduler
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Applies one event. Events of other guilds are dropped; every member or
    /// presence change of the observed guild asks for exactly one update.
    ///
    /// `Ready` only verifies guild membership and requests nothing. The
    /// connection-ready update is requested on `GuildAvailable`, once the
    /// roster snapshot and the channel list are known.
    pub fn handle_event(&self, event: GatewayEvent) -> Result<(), AppError> {
        if let Some(guild_id) = event.guild_id() {
            if guild_id != self.guild_id {
                debug!(kind = event.kind(), %guild_id, "event for another guild ignored");
                return Ok(());
            }
        }

        match event {
            GatewayEvent::Ready { user, guild_ids } => {
                info!("Bot logged in as {user}");
                if !guild_ids.contains(&self.guild_id) {
                    error!("Bot is not added to server ID - {}", self.guild_id);
                    return Err(AppError::GuildNotJoined(self.guild_id.clone()));
                }
                // Counting starts once the guild snapshot arrives.
                return Ok(());
            }
            GatewayEvent::GuildAvailable {
                name,
                members,
                channels,
                ..
            } => {
                info!("Connected to {name}");
                self.roster.replace(members);
                self.targets.resolve(&channels);
            }
            GatewayEvent::MembersAvailable { members, .. } => {
                self.roster.merge(members);
            }
            GatewayEvent::MemberAdded { member, .. } => {
                self.roster.upsert_member(&member.user_id, member.is_bot);
            }
            GatewayEvent::MemberRemoved { user_id, .. } => {
                self.roster.remove_member(&user_id);
            }
            GatewayEvent::MemberUpdated {
                user_id, is_bot, ..
            } => {
                self.roster.upsert_member(&user_id, is_bot);
            }
            GatewayEvent::PresenceUpdated {
                user_id, status, ..
            } => {
                if !self.roster.set_presence(&user_id, status) {
                    debug!(%user_id, "presence for unknown member");
                }
            }
        }

        self.scheduler.request();
        Ok(())
    }

    /// Consumes events until `shutdown` resolves, the event stream closes or
    /// a fatal event arrives; then runs the "Off" pass and returns.
    pub async fn run<F>(&self, mut events: Receiver<GatewayEvent>, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        warn!("gateway event stream closed");
                        break Err(AppError::EventsClosed);
                    };
                    if let Err(e) = self.handle_event(event) {
                        break Err(e);
                    }
                }
            }
        };

        self.shutdown().await;
        result
    }

    /// Closes the scheduler, then sets every resolved counter to "Off".
    /// A trailing update owed by the current window is dropped so it cannot
    /// overwrite the "Off" labels.
    pub async fn shutdown(&self) {
        self.scheduler.close();
        info!("Exiting…");
        shutdown_flush(&self.targets, self.renamer.as_ref(), self.shutdown_timeout).await;

        let snapshot = self.counters.snapshot();
        info!(
            updates = snapshot.updates,
            renames_ok = snapshot.renames_ok,
            renames_failed = snapshot.renames_failed,
            targets_unresolved = snapshot.targets_unresolved,
            requests = self.scheduler.requests_received(),
            "final counters"
        );
    }
}
