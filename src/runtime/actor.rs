//! Broker actor: one tokio task owning a dispatch engine.
//!
//! Notifications for one broker are serialized through the actor's mailbox,
//! which gives the single-threaded handling the engine expects while letting
//! several brokers run concurrently.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::core::{BrokerError, DispatchEngine, SimulationGateway, WorkItem};
use crate::runtime::api::{apply_notification, snapshot, BrokerNotification, BrokerSnapshot};

enum Command {
    Notify(BrokerNotification, oneshot::Sender<Result<(), BrokerError>>),
    Snapshot(oneshot::Sender<BrokerSnapshot>),
    Teardown(oneshot::Sender<Vec<WorkItem>>),
}

/// Cloneable handle to a running broker actor.
#[derive(Clone)]
pub struct BrokerHandle {
    tx: mpsc::Sender<Command>,
}

/// Move `engine` onto its own task. The actor stops after a teardown or once
/// every handle is dropped.
pub fn spawn_broker<G>(engine: DispatchEngine<G>, capacity: usize) -> (BrokerHandle, JoinHandle<()>)
where
    G: SimulationGateway + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(run(engine, rx));
    (BrokerHandle { tx }, task)
}

async fn run<G: SimulationGateway>(mut engine: DispatchEngine<G>, mut rx: mpsc::Receiver<Command>) {
    tracing::debug!("{}: broker actor started", engine.tenant());
    while let Some(command) = rx.recv().await {
        match command {
            Command::Notify(notification, reply) => {
                let _ = reply.send(apply_notification(&mut engine, notification));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(snapshot(&engine));
            }
            Command::Teardown(reply) => {
                let _ = reply.send(engine.teardown());
                break;
            }
        }
    }
    tracing::debug!("{}: broker actor stopped", engine.tenant());
}

impl BrokerHandle {
    /// Deliver a notification and wait for the broker to handle it.
    pub async fn notify(&self, notification: BrokerNotification) -> Result<(), BrokerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Notify(notification, reply))
            .await
            .map_err(|_| BrokerError::ActorClosed)?;
        rx.await.map_err(|_| BrokerError::ActorClosed)?
    }

    /// Current broker snapshot.
    pub async fn snapshot(&self) -> Result<BrokerSnapshot, BrokerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot(reply))
            .await
            .map_err(|_| BrokerError::ActorClosed)?;
        rx.await.map_err(|_| BrokerError::ActorClosed)
    }

    /// Tear the broker down and stop the actor, returning unfinished work.
    pub async fn teardown(&self) -> Result<Vec<WorkItem>, BrokerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Teardown(reply))
            .await
            .map_err(|_| BrokerError::ActorClosed)?;
        rx.await.map_err(|_| BrokerError::ActorClosed)
    }
}
