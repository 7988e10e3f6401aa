//! Background lookup execution
//!
//! Runs lookups on tokio tasks so the UI keeps drawing while requests are in
//! flight. Results come back over a channel tagged with their ticket; the
//! session decides whether they are still wanted.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::data::ViewModel;
use crate::session::{QueryError, QueryTicket, WeatherService};

/// Capacity of the result channel
const CHANNEL_CAPACITY: usize = 16;

/// Result of one background lookup
#[derive(Debug)]
pub struct QueryMessage {
    pub ticket: QueryTicket,
    pub result: Result<ViewModel, QueryError>,
}

/// Spawns lookups and collects their results
pub struct QueryDispatcher {
    service: Arc<WeatherService>,
    sender: mpsc::Sender<QueryMessage>,
    receiver: mpsc::Receiver<QueryMessage>,
}

impl QueryDispatcher {
    pub fn new(service: Arc<WeatherService>) -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            service,
            sender,
            receiver,
        }
    }

    /// Runs `ticket` on a background task
    ///
    /// Tasks are never cancelled; a superseded lookup still completes and its
    /// result is discarded by the session.
    pub fn spawn(&self, ticket: QueryTicket) {
        let service = Arc::clone(&self.service);
        let tx = self.sender.clone();

        tokio::spawn(async move {
            let result = service.run(&ticket).await;
            if tx.send(QueryMessage { ticket, result }).await.is_err() {
                tracing::debug!("dispatcher dropped before lookup finished");
            }
        });
    }

    /// Returns a finished lookup without blocking
    pub fn try_recv(&mut self) -> Option<QueryMessage> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the next finished lookup
    pub async fn recv(&mut self) -> Option<QueryMessage> {
        self.receiver.recv().await
    }
}
