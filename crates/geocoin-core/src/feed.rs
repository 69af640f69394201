//! Live position feed.
//!
//! A location sensor pushes fixes through a `PositionSender`, possibly from
//! its own thread. The session drains them one at a time, in arrival order,
//! through the same movement handler as manual steps. Stopping the watch
//! cancels immediately: queued fixes are dropped and later sends fail.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use geocoin_logic::cells::LatLon;
use thiserror::Error;

/// The watch was stopped; no further fixes are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("position feed is closed")]
pub struct FeedClosed;

/// Producer half, held by the position source.
#[derive(Debug, Clone)]
pub struct PositionSender {
    tx: Sender<LatLon>,
}

impl PositionSender {
    pub fn send(&self, lat: f64, lon: f64) -> Result<(), FeedClosed> {
        self.tx.send(LatLon::new(lat, lon)).map_err(|_| FeedClosed)
    }
}

/// Consumer half, held by the session.
#[derive(Debug)]
pub struct PositionWatch {
    rx: Option<Receiver<LatLon>>,
}

impl PositionWatch {
    /// Next pending fix, if any. Never blocks.
    pub fn next_fix(&mut self) -> Option<LatLon> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(fix) => Some(fix),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                None
            }
        }
    }

    /// Cancel the subscription.
    pub fn stop(&mut self) {
        if self.rx.take().is_some() {
            log::info!("Position watch stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}

/// Open a new position subscription.
pub fn position_feed() -> (PositionSender, PositionWatch) {
    let (tx, rx) = mpsc::channel();
    (PositionSender { tx }, PositionWatch { rx: Some(rx) })
}
