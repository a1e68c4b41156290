//! Restart orchestration for changed services.
//!
//! Restarts go through a control-plane endpoint that receives one message
//! per service. The control plane itself is a service too; when its own
//! configuration changed it must be restarted first and given time to come
//! back before it is asked to restart anything else.

use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

use serde_json::json;
use thiserror::Error;

/// Service name of the restart control plane.
pub const CONTROL_PLANE_SERVICE: &str = "TurnItOffAndOnAgain";

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("failed to reach the control plane: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("control plane rejected restart of '{service}' (status {status})")]
  Rejected { service: String, status: u16 },
}

/// Delivers a restart request for one service.
pub trait Notifier {
  fn restart(&self, service: &str) -> Result<(), NotifyError>;
}

/// Restart requests split into the two delivery phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPlan {
  /// Whether the control plane itself must be restarted first.
  pub control_plane: bool,
  /// Remaining services, in sorted order.
  pub fleet: Vec<String>,
}

impl RestartPlan {
  /// Partition a set of changed services into the two phases.
  pub fn from_changes(changed: &BTreeSet<String>) -> Self {
    Self {
      control_plane: changed.contains(CONTROL_PLANE_SERVICE),
      fleet: changed
        .iter()
        .filter(|s| s.as_str() != CONTROL_PLANE_SERVICE)
        .cloned()
        .collect(),
    }
  }

  pub fn is_empty(&self) -> bool {
    !self.control_plane && self.fleet.is_empty()
  }
}

/// Execute a restart plan.
///
/// The control plane goes first when it changed, followed by a settling
/// delay, but only when there is a fleet left to restart afterwards. Fleet
/// services are restarted one at a time in order; the first failure aborts
/// the run, leaving later services untouched.
pub fn run_plan(
  plan: &RestartPlan,
  notifier: &dyn Notifier,
  wait: Duration,
  sleep: impl Fn(Duration),
) -> Result<(), NotifyError> {
  if plan.control_plane {
    tracing::info!(service = CONTROL_PLANE_SERVICE, "restarting control plane");
    notifier.restart(CONTROL_PLANE_SERVICE)?;
    if !plan.fleet.is_empty() {
      tracing::debug!(seconds = wait.as_secs(), "waiting for control plane");
      sleep(wait);
    }
  }

  for service in &plan.fleet {
    tracing::info!(service = %service, "restarting");
    notifier.restart(service)?;
  }

  Ok(())
}

/// Restart every changed service through `notifier`, sleeping for real.
pub fn restart_services(
  changed: &BTreeSet<String>,
  notifier: &dyn Notifier,
  wait: Duration,
) -> Result<RestartPlan, NotifyError> {
  let plan = RestartPlan::from_changes(changed);
  run_plan(&plan, notifier, wait, thread::sleep)?;
  Ok(plan)
}

/// Notifier posting restart messages to the control-plane HTTP endpoint.
pub struct HttpNotifier {
  client: reqwest::blocking::Client,
  endpoint: String,
}

impl HttpNotifier {
  /// `base_url` is the control-plane root; messages go to `<base>/messages`.
  pub fn new(base_url: &str) -> Self {
    Self {
      client: reqwest::blocking::Client::new(),
      endpoint: format!("{}/messages", base_url.trim_end_matches('/')),
    }
  }
}

impl Notifier for HttpNotifier {
  fn restart(&self, service: &str) -> Result<(), NotifyError> {
    let response = self
      .client
      .post(&self.endpoint)
      .json(&json!({ "restart": service }))
      .send()?;

    let status = response.status();
    if status.is_success() {
      Ok(())
    } else {
      Err(NotifyError::Rejected {
        service: service.to_string(),
        status: status.as_u16(),
      })
    }
  }
}
