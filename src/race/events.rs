//! Discrete simulation events and the non-blocking bus that carries
//! them to audio/HUD collaborators.
//!
//! The simulation never waits on a consumer: events go out through a
//! bounded channel with `try_send`, and a slow or absent subscriber just
//! misses events instead of stalling physics.

use crossbeam_channel::{bounded, Receiver, Sender};

/// Start-light phase of the countdown sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPhase {
    Ready,
    Set,
    Go,
}

/// Something discrete happened this tick; audio and HUD key off these
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RaceEvent {
    /// Countdown advanced to a new phase
    Countdown(StartPhase),
    /// The player completed a gear change
    GearShift { gear: usize },
    Crash,
    Skid,
    SlipstreamBoost,
    /// A billboard was struck (and removed from the track)
    BillboardHit,
    /// Start/finish line crossed
    LapComplete { lap: u32, time: f32 },
    /// The next lap is the last one
    FinalLap,
    /// Race or qualifying attempt finished
    Finish,
}

/// Default capacity of the event channel
const DEFAULT_CAPACITY: usize = 256;

/// Bounded, non-blocking event fan-out
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: Sender<RaceEvent>,
    rx: Receiver<RaceEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// Publish an event without blocking. When no subscriber keeps up
    /// the oldest backlog is simply lost, which is the correct behavior
    /// for fire-and-forget audio cues.
    pub fn emit(&self, event: RaceEvent) {
        if self.tx.try_send(event).is_err() {
            // Channel full: drop the oldest event to make room
            let _ = self.rx.try_recv();
            let _ = self.tx.try_send(event);
        }
    }

    /// Handle for an external consumer (audio, HUD)
    pub fn subscribe(&self) -> Receiver<RaceEvent> {
        self.rx.clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_receive() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        bus.emit(RaceEvent::Crash);
        bus.emit(RaceEvent::Skid);
        assert_eq!(rx.try_recv().unwrap(), RaceEvent::Crash);
        assert_eq!(rx.try_recv().unwrap(), RaceEvent::Skid);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_bus_never_blocks() {
        let bus = EventBus::with_capacity(2);
        for _ in 0..100 {
            bus.emit(RaceEvent::Skid);
        }
        bus.emit(RaceEvent::Finish);
        // Latest event survived the overflow
        let rx = bus.subscribe();
        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert_eq!(last, Some(RaceEvent::Finish));
    }
}
