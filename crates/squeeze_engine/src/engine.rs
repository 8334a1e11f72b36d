use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use crate::probe::{ImageProber, ProbeSettings, ReqwestProber};
use crate::{detect_webp_support, EngineEvent, PageEpoch, RequestId};

enum EngineCommand {
    Probe {
        request_id: RequestId,
        epoch: PageEpoch,
        url: String,
    },
    DetectWebp,
}

/// Handle to the IO engine: a dedicated thread owning a tokio runtime, fed
/// through a command channel and drained through an event channel.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: ProbeSettings) -> Self {
        Self::with_prober(Arc::new(ReqwestProber::new(settings)))
    }

    /// Builds the engine around a caller-supplied prober.
    pub fn with_prober(prober: Arc<dyn ImageProber>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let prober = prober.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(prober.as_ref(), command, event_tx).await;
                });
            }
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    /// Queues the verification probe for one held-back redirect.
    pub fn probe(&self, request_id: RequestId, epoch: PageEpoch, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Probe {
            request_id,
            epoch,
            url: url.into(),
        });
    }

    /// Queues the one-shot WebP capability detection.
    pub fn detect_webp(&self) {
        let _ = self.cmd_tx.send(EngineCommand::DetectWebp);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx
            .lock()
            .ok()
            .and_then(|event_rx| event_rx.try_recv().ok())
    }
}

async fn handle_command(
    prober: &dyn ImageProber,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Probe {
            request_id,
            epoch,
            url,
        } => {
            let result = prober.probe(&url).await;
            let _ = event_tx.send(EngineEvent::ProbeResolved {
                request_id,
                epoch,
                result,
            });
        }
        EngineCommand::DetectWebp => {
            let supported = tokio::task::spawn_blocking(detect_webp_support)
                .await
                .unwrap_or(false);
            let _ = event_tx.send(EngineEvent::WebpDetected(supported));
        }
    }
}
