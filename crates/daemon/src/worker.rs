//! Display worker thread
//!
//! The session, its transport and the sensor sources are all blocking, so they
//! live on a dedicated OS thread. The Tokio runtime talks to it through a pair
//! of async channels: commands go in, lifecycle events come out.

use async_channel::{Receiver, Sender, TryRecvError, bounded, unbounded};
use common::{Clock, SensorHub, Session, Transport};
use protocol::ConfigDocument;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info};

/// Commands from the runtime to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    Shutdown,
}

/// Events from the worker to the runtime
#[derive(Debug)]
pub enum WorkerEvent {
    /// Handshake and configuration were sent
    Streaming,
    /// One telemetry report was sent
    Tick { sequence: u64 },
    /// The worker exited; carries the number of telemetry ticks sent
    Stopped(common::Result<u64>),
}

/// Runtime side of the channel pair
pub struct WorkerBridge {
    cmd_tx: Sender<WorkerCommand>,
    event_rx: Receiver<WorkerEvent>,
}

impl WorkerBridge {
    /// Ask the worker to stop after the current tick
    pub fn shutdown(&self) {
        // Full or closed both mean a stop is already underway
        let _ = self.cmd_tx.try_send(WorkerCommand::Shutdown);
    }

    pub async fn recv_event(&self) -> Option<WorkerEvent> {
        self.event_rx.recv().await.ok()
    }
}

/// Worker side of the channel pair
pub struct WorkerChannels {
    cmd_rx: Receiver<WorkerCommand>,
    event_tx: Sender<WorkerEvent>,
}

impl WorkerChannels {
    fn send_event(&self, event: WorkerEvent) {
        if self.event_tx.send_blocking(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    fn stop_requested(&self) -> bool {
        match self.cmd_rx.try_recv() {
            Ok(WorkerCommand::Shutdown) | Err(TryRecvError::Closed) => true,
            Err(TryRecvError::Empty) => false,
        }
    }
}

/// Create the channel bridge between Tokio and the worker thread
pub fn create_worker_bridge() -> (WorkerBridge, WorkerChannels) {
    let (cmd_tx, cmd_rx) = bounded(1);
    let (event_tx, event_rx) = unbounded();

    (
        WorkerBridge { cmd_tx, event_rx },
        WorkerChannels { cmd_rx, event_tx },
    )
}

/// Drives one session from handshake to shutdown
pub struct DisplayWorker<T: Transport, C: Clock> {
    session: Session<T, C>,
    sensors: SensorHub,
    document: ConfigDocument,
    tick_interval: Duration,
    max_ticks: Option<u64>,
}

impl<T: Transport, C: Clock> DisplayWorker<T, C> {
    pub fn new(
        session: Session<T, C>,
        sensors: SensorHub,
        document: ConfigDocument,
        tick_interval: Duration,
        max_ticks: Option<u64>,
    ) -> Self {
        Self {
            session,
            sensors,
            document,
            tick_interval,
            max_ticks,
        }
    }

    /// Run until shutdown, the tick limit, or a fatal transport error
    ///
    /// Returns the number of telemetry reports sent.
    pub fn run(mut self, channels: &WorkerChannels) -> common::Result<u64> {
        info!("Display worker started");

        self.session.connect()?;
        self.session.configure(self.document.clone())?;
        self.session.start_streaming()?;
        channels.send_event(WorkerEvent::Streaming);

        let mut ticks = 0;
        loop {
            if channels.stop_requested() {
                info!("Display worker shutting down");
                break;
            }
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                info!("Tick limit of {} reached", ticks);
                break;
            }

            self.session.clock().sleep(self.tick_interval);
            self.session.tick(&mut self.sensors)?;
            ticks += 1;
            channels.send_event(WorkerEvent::Tick {
                sequence: self.session.sequence(),
            });
        }

        info!("Display worker stopped after {} ticks", ticks);
        Ok(ticks)
    }
}

/// Spawn the display worker thread
///
/// The thread reports its outcome as a final [`WorkerEvent::Stopped`].
pub fn spawn_display_worker<T, C>(
    worker: DisplayWorker<T, C>,
    channels: WorkerChannels,
) -> std::io::Result<JoinHandle<()>>
where
    T: Transport + Send + 'static,
    C: Clock + Send + 'static,
{
    std::thread::Builder::new()
        .name("display-worker".to_string())
        .spawn(move || {
            let result = worker.run(&channels);
            if let Err(e) = &result {
                error!("Display worker failed: {}", e);
            }
            channels.send_event(WorkerEvent::Stopped(result));
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::sensors::{CpuReading, MemoryReading};
    use common::test_utils::{
        FixedClock, MemoryTransport, StaticCpu, StaticMemory, sample_config,
    };
    use common::{Error, SessionSettings, SystemClock};

    fn sensors() -> SensorHub {
        SensorHub::new(
            Box::new(StaticCpu(CpuReading::default())),
            Box::new(StaticMemory(MemoryReading::default())),
            None,
        )
    }

    fn worker(
        transport: MemoryTransport,
        max_ticks: Option<u64>,
    ) -> DisplayWorker<MemoryTransport, FixedClock> {
        DisplayWorker::new(
            Session::new(transport, FixedClock::new(0), SessionSettings::default()),
            sensors(),
            sample_config(),
            Duration::from_secs(1),
            max_ticks,
        )
    }

    fn drain(bridge: &WorkerBridge) -> Vec<WorkerEvent> {
        std::iter::from_fn(|| bridge.event_rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_run_stops_at_tick_limit() {
        let (bridge, channels) = create_worker_bridge();
        let ticks = worker(MemoryTransport::new(), Some(3))
            .run(&channels)
            .unwrap();
        assert_eq!(ticks, 3);

        let events = drain(&bridge);
        assert!(matches!(events[0], WorkerEvent::Streaming));
        let sequences: Vec<u64> = events[1..]
            .iter()
            .map(|e| match e {
                WorkerEvent::Tick { sequence } => *sequence,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(sequences, vec![3, 4, 5]);
    }

    #[test]
    fn test_shutdown_before_first_tick() {
        let (bridge, channels) = create_worker_bridge();
        bridge.shutdown();
        bridge.shutdown();

        let ticks = worker(MemoryTransport::new(), None).run(&channels).unwrap();
        assert_eq!(ticks, 0);
    }

    #[test]
    fn test_dropped_bridge_stops_worker() {
        let (bridge, channels) = create_worker_bridge();
        drop(bridge);

        let ticks = worker(MemoryTransport::new(), None).run(&channels).unwrap();
        assert_eq!(ticks, 0);
    }

    #[test]
    fn test_write_failure_ends_run() {
        let (_bridge, channels) = create_worker_bridge();
        let err = worker(MemoryTransport::new().fail_writes_after(4), None)
            .run(&channels)
            .unwrap_err();
        assert!(matches!(err, Error::TransportWrite(_)));
    }

    #[tokio::test]
    async fn test_spawned_worker_reports_stop() {
        let (bridge, channels) = create_worker_bridge();
        let settings = SessionSettings {
            settle_delay: Duration::ZERO,
            read_timeout: Duration::ZERO,
            ..SessionSettings::default()
        };
        let worker = DisplayWorker::new(
            Session::new(MemoryTransport::new(), SystemClock, settings),
            sensors(),
            sample_config(),
            Duration::from_millis(1),
            Some(2),
        );
        let handle = spawn_display_worker(worker, channels).unwrap();

        let mut stopped = None;
        while let Some(event) = bridge.recv_event().await {
            if let WorkerEvent::Stopped(result) = event {
                stopped = Some(result);
                break;
            }
        }
        handle.join().unwrap();
        assert_eq!(stopped.unwrap().unwrap(), 2);
    }
}
