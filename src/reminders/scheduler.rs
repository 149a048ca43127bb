use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::{OffsetDateTime, Time};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::outbound::MessageSender;
use crate::users;

/// Scheduling seam for the dialogue core: it talks to this interface and
/// never owns job state itself.
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    /// Arms (or re-arms, replacing an existing job with the same id) a daily
    /// delivery of `body` to `to` at `hh_mm` UTC.
    async fn schedule(&self, job_id: &str, hh_mm: &str, to: &str, body: &str)
        -> anyhow::Result<()>;
    async fn cancel(&self, job_id: &str) -> anyhow::Result<()>;
}

pub fn parse_hh_mm(raw: &str) -> Option<(u8, u8)> {
    let (h, m) = raw.trim().split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let hour: u8 = h.parse().ok()?;
    let minute: u8 = m.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

fn seconds_until(hour: u8, minute: u8, now: OffsetDateTime) -> i64 {
    let at = Time::from_hms(hour, minute, 0).expect("validated HH:MM");
    let mut target = now.replace_time(at);
    if target <= now {
        target += time::Duration::days(1);
    }
    (target - now).whole_seconds()
}

/// Tokio-task based daily scheduler. One task per job id, aborted on cancel
/// or replacement.
pub struct CronScheduler {
    sender: Arc<dyn MessageSender>,
    jobs: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl CronScheduler {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self {
            sender,
            jobs: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ReminderScheduler for CronScheduler {
    async fn schedule(
        &self,
        job_id: &str,
        hh_mm: &str,
        to: &str,
        body: &str,
    ) -> anyhow::Result<()> {
        let (hour, minute) =
            parse_hh_mm(hh_mm).with_context(|| format!("invalid reminder time {hh_mm:?}"))?;
        let sender = self.sender.clone();
        let id = job_id.to_string();
        let to = to.to_string();
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            loop {
                let secs = seconds_until(hour, minute, OffsetDateTime::now_utc());
                tokio::time::sleep(Duration::from_secs(secs.max(1) as u64)).await;
                if let Err(e) = sender.send(&to, &body).await {
                    warn!(error = %e, job = %id, "reminder delivery failed");
                }
                // Step past the fired minute before re-arming.
                tokio::time::sleep(Duration::from_secs(61)).await;
            }
        });

        let mut jobs = self.jobs.lock().expect("scheduler lock");
        if let Some(old) = jobs.insert(job_id.to_string(), handle) {
            old.abort();
        }
        info!(job = %job_id, %hh_mm, "reminder scheduled");
        Ok(())
    }

    async fn cancel(&self, job_id: &str) -> anyhow::Result<()> {
        if let Some(handle) = self.jobs.lock().expect("scheduler lock").remove(job_id) {
            handle.abort();
            info!(job = %job_id, "reminder cancelled");
        }
        Ok(())
    }
}

/// Daily greeting for users who have not interacted today.
pub fn spawn_daily_greeting(
    db: PgPool,
    sender: Arc<dyn MessageSender>,
    hh_mm: &str,
    body: String,
) -> anyhow::Result<JoinHandle<()>> {
    let (hour, minute) =
        parse_hh_mm(hh_mm).with_context(|| format!("invalid greeting time {hh_mm:?}"))?;
    Ok(tokio::spawn(async move {
        loop {
            let secs = seconds_until(hour, minute, OffsetDateTime::now_utc());
            tokio::time::sleep(Duration::from_secs(secs.max(1) as u64)).await;
            match users::stale_numbers(&db).await {
                Ok(numbers) => {
                    for number in numbers {
                        if let Err(e) = sender.send(&number, &body).await {
                            warn!(error = %e, %number, "greeting delivery failed");
                        }
                    }
                }
                Err(e) => warn!(error = %e, "greeting user listing failed"),
            }
            tokio::time::sleep(Duration::from_secs(61)).await;
        }
    }))
}
