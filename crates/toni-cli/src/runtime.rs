// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::prefs::PrefsFile;
use anyhow::{Context, Result, anyhow, bail};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use toni_app::Suggestion;
use toni_app::prefs::UiPreferences;
use toni_app::repository::{RepoOutcome, RepoRequest, execute};
use toni_db::Store;
use toni_tui::InternalEvent;
use tracing::{debug, info};

struct Job {
    request: RepoRequest,
    reply: Sender<InternalEvent>,
}

/// Runs repository work on one thread that owns the store, so requests are
/// applied one at a time in the order they were sent. Lookups get a thread
/// each; stale answers are discarded by the session, not here.
pub struct WorkerRuntime {
    jobs: Sender<Job>,
    worker: JoinHandle<()>,
    places: Option<toni_places::Client>,
    prefs: PrefsFile,
}

impl WorkerRuntime {
    pub fn start(
        store: Store,
        places: Option<toni_places::Client>,
        prefs: PrefsFile,
    ) -> Result<Self> {
        let (jobs, inbox) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name("toni-repository".to_owned())
            .spawn(move || {
                for job in inbox {
                    let outcome = execute(&store, job.request);
                    if job.reply.send(InternalEvent::Repository(outcome)).is_err() {
                        debug!("repository reply dropped; event loop is gone");
                    }
                }
                info!("repository worker stopped");
            })
            .context("start repository worker thread")?;

        Ok(Self {
            jobs,
            worker,
            places,
            prefs,
        })
    }

    /// Stops accepting work and waits for queued requests to finish.
    pub fn shutdown(self) -> Result<()> {
        drop(self.jobs);
        self.worker
            .join()
            .map_err(|_| anyhow!("repository worker panicked"))
    }

    fn send(&self, request: RepoRequest, reply: Sender<InternalEvent>) -> Result<()> {
        self.jobs
            .send(Job { request, reply })
            .map_err(|_| anyhow!("repository worker stopped; restart toni"))
    }
}

impl toni_tui::AppRuntime for WorkerRuntime {
    fn run_request(&mut self, request: RepoRequest) -> Result<RepoOutcome> {
        let (tx, rx) = mpsc::channel();
        self.send(request, tx)?;
        match rx.recv() {
            Ok(InternalEvent::Repository(outcome)) => Ok(outcome),
            Ok(other) => bail!("unexpected repository reply {other:?}"),
            Err(_) => bail!("repository worker stopped before replying"),
        }
    }

    fn lookup_suggestions(&mut self, query: &str) -> Result<Vec<Suggestion>> {
        match &self.places {
            Some(client) => client.lookup(query),
            None => bail!("suggestions are disabled -- set TONI_PLACES_API_KEY to enable them"),
        }
    }

    fn save_preferences(&mut self, prefs: &UiPreferences) -> Result<()> {
        self.prefs.save(prefs)
    }

    fn spawn_request(&mut self, request: RepoRequest, tx: Sender<InternalEvent>) -> Result<()> {
        self.send(request, tx)
    }

    fn spawn_lookup(&mut self, sequence: u64, query: &str, tx: Sender<InternalEvent>) -> Result<()> {
        let Some(client) = self.places.clone() else {
            bail!("suggestions are disabled -- set TONI_PLACES_API_KEY to enable them");
        };
        let query = query.to_owned();
        thread::Builder::new()
            .name("toni-lookup".to_owned())
            .spawn(move || {
                let result = client.lookup(&query).map_err(|error| format!("{error:#}"));
                // the loop may have exited while the request was in flight
                let _ = tx.send(InternalEvent::Suggestions { sequence, result });
            })
            .context("start suggestion lookup thread")?;
        Ok(())
    }
}
