use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::appm::AppmClient;

/// Snapshot of a mapping run, refreshed by the status worker.
#[derive(Debug, Clone, Default)]
pub struct MappingProgress {
    pub run_state: String,
    pub current_point: i32,
}

/// Background task that polls the APPM run status once per second and
/// publishes it through shared state. Exits on its own when the API
/// stops answering.
pub struct StatusWorker {
    shared: Arc<Mutex<MappingProgress>>,
    stop_tx: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl StatusWorker {
    pub fn spawn(client: AppmClient) -> Self {
        let shared = Arc::new(Mutex::new(MappingProgress::default()));
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let worker_shared = shared.clone();
        let join = tokio::spawn(async move {
            loop {
                match client.status().await {
                    Ok(status) => {
                        let mut locked = worker_shared.lock().unwrap();
                        locked.run_state = status.status.mapping_run_state;
                        locked.current_point = status.status.measurement_points_count;
                    }
                    Err(e) => {
                        log::debug!("Status worker is exiting: {e}");
                        return;
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    _ = &mut stop_rx => return,
                }
            }
        });

        Self { shared, stop_tx: Some(stop_tx), join: Some(join) }
    }

    pub fn progress(&self) -> MappingProgress {
        self.shared.lock().unwrap().clone()
    }

    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}
