//! Detection and satisfaction of the consent interstitial.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::pacing::secs;
use crate::browser::{AffirmativeControl, BrowsingSurface};
use crate::session::SessionStore;
use crate::site::is_gate_url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Text of the control that acknowledges the gate.
    pub affirmative_label: String,
    /// How long each control candidate is given to appear.
    pub candidate_timeout_ms: u64,
    /// How long to wait for the post-click navigation.
    pub settle_timeout_secs: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            affirmative_label: "Yes".to_string(),
            candidate_timeout_ms: 5000,
            settle_timeout_secs: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Open,
    Gated,
}

impl GateState {
    pub fn of(url: &str) -> Self {
        if is_gate_url(url) {
            GateState::Gated
        } else {
            GateState::Open
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GateHandler {
    config: GateConfig,
}

impl GateHandler {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn is_gated(&self, url: &str) -> bool {
        GateState::of(url) == GateState::Gated
    }

    /// If the surface is showing the gate, click through it and save the session.
    ///
    /// A click only counts once the surface has left the gate URL. Returns
    /// true when that happened and the session was persisted. The caller is
    /// responsible for re-navigating.
    pub async fn satisfy_if_gated<S: BrowsingSurface + ?Sized>(
        &self,
        surface: &mut S,
        sessions: &SessionStore,
    ) -> bool {
        let url = match surface.current_url().await {
            Ok(url) => url,
            Err(e) => {
                warn!("Could not read current URL while checking for gate: {}", e);
                return false;
            }
        };
        if !self.is_gated(&url) {
            return false;
        }

        info!("Consent gate detected at {}", url);

        let label = self.config.affirmative_label.as_str();
        let per_candidate = Duration::from_millis(self.config.candidate_timeout_ms);
        let mut cleared = None;
        for control in AffirmativeControl::PRIORITY {
            match surface.actuate(control, label, per_candidate).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("No '{}' {} on gate", label, control.describe());
                    continue;
                }
                Err(e) => {
                    debug!("Gate {} check failed: {}", control.describe(), e);
                    continue;
                }
            }

            if let Err(e) = surface
                .wait_for_settle(secs(self.config.settle_timeout_secs))
                .await
            {
                debug!("Navigation after gate click did not settle: {}", e);
            }

            match surface.current_url().await {
                Ok(after) if !self.is_gated(&after) => {
                    cleared = Some(control);
                    break;
                }
                Ok(_) => debug!("Clicked {} but the gate is still showing", control.describe()),
                Err(e) => debug!("Could not read URL after clicking {}: {}", control.describe(), e),
            }
        }

        let Some(control) = cleared else {
            warn!(
                "Could not find the '{}' control on the consent gate. \
                 Run once with --headed and click it manually; the session is saved for later runs.",
                label
            );
            return false;
        };

        match sessions.capture(surface).await {
            Ok(count) => {
                info!(
                    "Consent gate satisfied via {}; saved {} cookies",
                    control.describe(),
                    count
                );
                true
            }
            Err(e) => {
                warn!("Gate clicked but session could not be saved: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeSurface, FAKE_GATE_URL};
    use tempfile::TempDir;

    const HOME: &str = "https://www.justice.gov/epstein";

    fn store(dir: &TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("storage_state.json"))
    }

    #[test]
    fn test_gate_state_from_url() {
        assert_eq!(GateState::of(FAKE_GATE_URL), GateState::Gated);
        assert_eq!(GateState::of(HOME), GateState::Open);
        assert!(GateHandler::default().is_gated("https://x.test/AGE-VERIFY"));
    }

    #[tokio::test]
    async fn test_open_page_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let mut surface = FakeSurface::new();
        surface.goto(HOME, None, Duration::ZERO).await.unwrap();

        assert!(!GateHandler::default().satisfy_if_gated(&mut surface, &store(&dir)).await);
        assert!(surface.actuations.is_empty());
        assert_eq!(surface.exports, 0);
    }

    #[tokio::test]
    async fn test_candidates_tried_in_priority_order() {
        let dir = TempDir::new().unwrap();
        let mut surface = FakeSurface::new().gated();
        surface.gate_control = Some(AffirmativeControl::AnchorWithText);
        surface.goto(HOME, None, Duration::ZERO).await.unwrap();

        let sessions = store(&dir);
        assert!(GateHandler::default().satisfy_if_gated(&mut surface, &sessions).await);
        assert_eq!(
            surface.actuations,
            vec![
                AffirmativeControl::ExactText,
                AffirmativeControl::RoleButton,
                AffirmativeControl::ButtonWithText,
                AffirmativeControl::AnchorWithText,
            ]
        );
        assert!(!surface.gate_active);
        assert!(sessions.load().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_click_that_leaves_gate_up_tries_next_candidate() {
        let dir = TempDir::new().unwrap();
        let mut surface = FakeSurface::new().gated();
        surface.inert_control = Some(AffirmativeControl::ExactText);
        surface.gate_control = Some(AffirmativeControl::ButtonWithText);
        surface.goto(HOME, None, Duration::ZERO).await.unwrap();

        let sessions = store(&dir);
        assert!(GateHandler::default().satisfy_if_gated(&mut surface, &sessions).await);
        assert_eq!(
            surface.actuations,
            vec![
                AffirmativeControl::ExactText,
                AffirmativeControl::RoleButton,
                AffirmativeControl::ButtonWithText,
            ]
        );
        assert!(!surface.gate_active);
    }

    #[tokio::test]
    async fn test_only_inert_click_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let mut surface = FakeSurface::new().unclickable_gate();
        surface.inert_control = Some(AffirmativeControl::ExactText);
        surface.goto(HOME, None, Duration::ZERO).await.unwrap();

        let sessions = store(&dir);
        assert!(!GateHandler::default().satisfy_if_gated(&mut surface, &sessions).await);
        assert_eq!(surface.current, FAKE_GATE_URL);
        assert!(sessions.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unclickable_gate_stays_gated() {
        let dir = TempDir::new().unwrap();
        let mut surface = FakeSurface::new().unclickable_gate();
        surface.goto(HOME, None, Duration::ZERO).await.unwrap();

        let sessions = store(&dir);
        assert!(!GateHandler::default().satisfy_if_gated(&mut surface, &sessions).await);
        assert_eq!(surface.actuations.len(), AffirmativeControl::PRIORITY.len());
        assert_eq!(surface.current, FAKE_GATE_URL);
        assert!(sessions.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persist_failure_reports_false() {
        let dir = TempDir::new().unwrap();
        // A directory in place of the session file makes the save fail.
        let blocked = dir.path().join("storage_state.json");
        std::fs::create_dir(&blocked).unwrap();
        let mut surface = FakeSurface::new().gated();
        surface.goto(HOME, None, Duration::ZERO).await.unwrap();

        let sessions = SessionStore::new(blocked);
        assert!(!GateHandler::default().satisfy_if_gated(&mut surface, &sessions).await);
        assert!(!surface.gate_active);
    }
}
