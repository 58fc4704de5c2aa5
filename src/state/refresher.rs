use crate::state::messages::NetworkRequest;
use foosball_api::cache::TABLE_TTL;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Reloads the tables once per cache window so games recorded from another
/// machine show up without a manual refresh.
pub struct PeriodicRefresher {
    network_requests: mpsc::Sender<NetworkRequest>,
}

impl PeriodicRefresher {
    pub fn new(network_requests: mpsc::Sender<NetworkRequest>) -> Self {
        Self { network_requests }
    }

    pub async fn run(self) {
        let mut reload_interval = interval(TABLE_TTL);
        // Skip the immediate first tick so startup loading isn't double-triggered.
        reload_interval.tick().await;

        loop {
            reload_interval.tick().await;
            if self.network_requests.send(NetworkRequest::Reload).await.is_err() {
                break;
            }
        }
    }
}
