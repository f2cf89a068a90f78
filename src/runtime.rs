use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEventKind};

use crate::error::GeolocationError;
use crate::workout::Location;

/// Everything the main loop reacts to
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(crossterm::event::KeyEvent),
    Resize,
    Tick,
    /// Outcome of the one-shot startup position request
    Located(Result<Location, GeolocationError>),
}

pub trait AppEventSource {
    /// Waits up to `timeout` for the next event
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Events pushed by any thread holding a [`sender`](Self::sender)
pub struct ChannelEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

impl Default for ChannelEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel source fed by a crossterm reader thread
pub struct CrosstermEventSource {
    channel: ChannelEventSource,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let channel = ChannelEventSource::new();
        let tx = channel.sender();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // windows reports releases too
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => tx.send(AppEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { channel }
    }

    /// Handle for background work that reports back into the loop
    pub fn sender(&self) -> Sender<AppEvent> {
        self.channel.sender()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.channel.recv_timeout(timeout)
    }
}

/// Hands out one event per step, or `Tick` when none arrives within `tick`
pub struct Runner<E: AppEventSource> {
    event_source: E,
    tick: Duration,
}

impl<E: AppEventSource> Runner<E> {
    pub fn new(event_source: E, tick: Duration) -> Self {
        Self { event_source, tick }
    }

    pub fn step(&self) -> AppEvent {
        self.event_source
            .recv_timeout(self.tick)
            .unwrap_or(AppEvent::Tick)
    }

    pub fn event_source(&self) -> &E {
        &self.event_source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_step_ticks() {
        let runner = Runner::new(ChannelEventSource::new(), Duration::from_millis(1));
        assert!(matches!(runner.step(), AppEvent::Tick));
    }

    #[test]
    fn events_from_other_threads_arrive_in_order() {
        let runner = Runner::new(ChannelEventSource::new(), Duration::from_millis(500));
        let tx = runner.event_source().sender();
        std::thread::spawn(move || {
            tx.send(AppEvent::Resize).unwrap();
            tx.send(AppEvent::Located(Ok(Location::new(1.0, 2.0)))).unwrap();
        });

        assert!(matches!(runner.step(), AppEvent::Resize));
        match runner.step() {
            AppEvent::Located(Ok(loc)) => assert_eq!(loc, Location::new(1.0, 2.0)),
            other => panic!("expected Located, got {other:?}"),
        }
    }
}
