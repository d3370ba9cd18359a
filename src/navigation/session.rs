use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{capabilities::Capability, narration::NarrationService};

use super::{geo::Coordinates, Geolocation, PositionFix};

// Set to true to log every position fix
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const WAITING_FOR_GPS: &str = "Waiting for GPS...";
pub const ARRIVED: &str = "You have arrived at your destination!";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationUpdate {
    pub position: Option<Coordinates>,
    pub distance_m: Option<f64>,
    pub bearing_deg: Option<f64>,
    pub instructions: String,
    pub arrived: bool,
}

impl NavigationUpdate {
    fn waiting() -> Self {
        Self {
            position: None,
            distance_m: None,
            bearing_deg: None,
            instructions: WAITING_FOR_GPS.to_string(),
            arrived: false,
        }
    }
}

/// Clears the platform watch exactly once, whichever of close/drop gets there first.
struct WatchGuard {
    geolocation: Arc<dyn Geolocation>,
    watch_id: u64,
    released: AtomicBool,
}

impl WatchGuard {
    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            log_debug!("clearing position watch {}", self.watch_id);
            self.geolocation.clear_watch(self.watch_id);
        }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Live guidance toward one destination. Dropping the session stops tracking.
pub struct NavigationSession {
    title: String,
    destination: Coordinates,
    narration: NarrationService,
    updates: watch::Receiver<NavigationUpdate>,
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    guard: WatchGuard,
}

impl NavigationSession {
    /// Starts watching the device position. Must be called inside a tokio runtime.
    pub fn open(
        geolocation: &Capability<dyn Geolocation>,
        destination: Coordinates,
        title: &str,
        narration: NarrationService,
        arrival_radius_m: f64,
    ) -> Result<Self> {
        let Some(geolocation) = geolocation.get().cloned() else {
            narration.speak("GPS not available");
            return Err(anyhow!("geolocation is not available on this device"));
        };

        let watch = match geolocation.watch_position() {
            Ok(watch) => watch,
            Err(err) => {
                narration.speak("GPS not available");
                return Err(err.context("failed to start watching position"));
            }
        };

        let guard = WatchGuard {
            geolocation,
            watch_id: watch.id,
            released: AtomicBool::new(false),
        };

        let (tx, updates) = watch::channel(NavigationUpdate::waiting());
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(tracking_loop(
            watch.fixes,
            destination,
            arrival_radius_m,
            narration.clone(),
            tx,
            cancel_token.clone(),
        ));

        log_info!("navigation to {title} started on watch {}", watch.id);

        Ok(Self {
            title: title.to_string(),
            destination,
            narration,
            updates,
            cancel_token,
            handle: Some(handle),
            guard,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn destination(&self) -> Coordinates {
        self.destination
    }

    pub fn current(&self) -> NavigationUpdate {
        self.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NavigationUpdate> {
        self.updates.clone()
    }

    /// Speaks the instructions currently on screen.
    pub fn read_instructions(&self) -> Option<u64> {
        let instructions = self.updates.borrow().instructions.clone();
        self.narration.speak(&instructions)
    }

    /// Stops tracking, releases the position watch, and waits for the loop to exit.
    pub async fn close(mut self) -> Result<()> {
        self.cancel_token.cancel();
        self.guard.release();

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("navigation loop task failed to join")?;
        }
        Ok(())
    }
}

impl Drop for NavigationSession {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn tracking_loop(
    mut fixes: mpsc::Receiver<PositionFix>,
    destination: Coordinates,
    arrival_radius_m: f64,
    narration: NarrationService,
    updates: watch::Sender<NavigationUpdate>,
    cancel_token: CancellationToken,
) {
    let mut has_fix = false;
    let mut at_destination = false;

    loop {
        let fix = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            fix = fixes.recv() => fix,
        };

        let Some(fix) = fix else {
            log_debug!("position stream ended");
            break;
        };

        match fix {
            PositionFix::Position(position) => {
                if !has_fix {
                    has_fix = true;
                    narration.speak("Navigation started");
                }

                let distance = position.distance_to(&destination);
                let bearing = position.bearing_to(&destination);
                let arrived = distance < arrival_radius_m;

                if arrived && !at_destination {
                    narration.speak("Destination reached");
                }
                at_destination = arrived;

                let instructions = if arrived {
                    ARRIVED.to_string()
                } else {
                    format!("{}m to destination", distance.round() as u64)
                };
                log_debug!("fix {position:?}: {instructions}");

                updates.send_replace(NavigationUpdate {
                    position: Some(position),
                    distance_m: Some(distance),
                    bearing_deg: Some(bearing),
                    instructions,
                    arrived,
                });
            }
            PositionFix::Error(reason) => {
                log_warn!("position watch error: {reason}");
                narration.speak("GPS error occurred");
                updates.send_modify(|update| update.instructions = "GPS error".to_string());
            }
        }
    }
}
