use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::time::Instant;

use crate::ProviderId;

/// Per-source health as seen by the router and the `sources` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceHealth {
    pub healthy: bool,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub last_check: Option<OffsetDateTime>,
    pub response_time_ms: u64,
    /// Consecutive failures; reset by any success.
    pub failures: u32,
    /// Consecutive errors or timeouts; a clean miss resets it.
    pub outages: u32,
    /// Set once `outages` reaches the threshold; the router stops calling
    /// the source until a trial call gets an answer.
    pub gated: bool,
}

impl Default for SourceHealth {
    fn default() -> Self {
        Self {
            healthy: true,
            last_check: None,
            response_time_ms: 0,
            failures: 0,
            outages: 0,
            gated: false,
        }
    }
}

fn serialize_rfc3339<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value.map(|instant| instant.format(&Rfc3339)) {
        Some(Ok(formatted)) => serializer.serialize_str(&formatted),
        _ => serializer.serialize_none(),
    }
}

/// Thresholds and timers for marking sources unhealthy and probing them again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    pub failure_threshold: u32,
    pub probe_cooldown: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            probe_cooldown: Duration::from_secs(60),
        }
    }
}

/// Whether the router may call a source right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Healthy source, call as usual.
    Allow,
    /// Gated source whose cooldown elapsed; this call is the single trial.
    Probe,
    /// Gated source still cooling down, or already being probed.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observation {
    Found,
    Miss,
    Outage,
}

#[derive(Debug, Default)]
struct HealthEntry {
    health: SourceHealth,
    last_attempt: Option<Instant>,
    probe_started: Option<Instant>,
}

/// Process-lifetime registry of [`SourceHealth`], one entry per source.
///
/// The tracker is an explicit value shared through `Arc`; each router and
/// test gets its own.
#[derive(Debug, Default)]
pub struct HealthTracker {
    policy: HealthPolicy,
    entries: Mutex<HashMap<ProviderId, HealthEntry>>,
}

impl HealthTracker {
    pub fn new(policy: HealthPolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Records the outcome of one attempt.
    ///
    /// A success marks the source healthy and clears both streaks. A failure
    /// here is an outage (error or timeout): it counts towards `failures` and
    /// towards the dispatch gate.
    pub fn record(&self, provider: ProviderId, success: bool, response_time_ms: u64) {
        let observation = if success {
            Observation::Found
        } else {
            Observation::Outage
        };
        self.observe(provider, observation, response_time_ms);
    }

    /// Records a clean "not found" answer.
    ///
    /// The miss still counts towards `failures` and `healthy`, but the source
    /// did answer, so the outage streak is cleared and the gate reopens.
    pub fn record_miss(&self, provider: ProviderId, response_time_ms: u64) {
        self.observe(provider, Observation::Miss, response_time_ms);
    }

    fn observe(&self, provider: ProviderId, observation: Observation, response_time_ms: u64) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(provider).or_default();
        let health = &mut entry.health;

        health.last_check = Some(OffsetDateTime::now_utc());
        health.response_time_ms = response_time_ms;
        entry.last_attempt = Some(Instant::now());
        entry.probe_started = None;

        match observation {
            Observation::Found => {
                health.healthy = true;
                health.failures = 0;
            }
            Observation::Miss | Observation::Outage => {
                health.failures = health.failures.saturating_add(1);
                if health.failures >= self.policy.failure_threshold {
                    health.healthy = false;
                }
            }
        }

        if observation == Observation::Outage {
            health.outages = health.outages.saturating_add(1);
            if health.outages >= self.policy.failure_threshold {
                health.gated = true;
            }
        } else {
            health.outages = 0;
            health.gated = false;
        }
    }

    pub fn get(&self, provider: ProviderId) -> Option<SourceHealth> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&provider).map(|entry| entry.health)
    }

    /// Decides whether `provider` may be called now.
    ///
    /// A gated source gets one trial call once `probe_cooldown` has passed
    /// since its last attempt. A trial that never reports back stops
    /// blocking new trials after another cooldown.
    pub fn allow_dispatch(&self, provider: ProviderId) -> Dispatch {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = entries.get_mut(&provider) else {
            return Dispatch::Allow;
        };
        if !entry.health.gated {
            return Dispatch::Allow;
        }

        let now = Instant::now();
        let cooldown = self.policy.probe_cooldown;
        let probe_pending = entry
            .probe_started
            .is_some_and(|started| now.duration_since(started) < cooldown);
        let cooled_down = entry
            .last_attempt
            .is_none_or(|attempt| now.duration_since(attempt) >= cooldown);

        if probe_pending || !cooled_down {
            return Dispatch::Skip;
        }

        entry.probe_started = Some(now);
        Dispatch::Probe
    }
}
