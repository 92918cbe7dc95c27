//! Single-owner task around a [`Router`].
//!
//! The router is moved into a tokio task and every access goes through a
//! request channel, so callers on any task can share it without locks.
//! Requests are applied strictly in arrival order.

use crate::command::{Command, Output};
use crate::error::RouterError;
use crate::forwarding::{ForwardingDecision, ForwardingEntry};
use crate::network::InterfaceId;
use crate::protocol::{Advertisement, RoutingUpdate};
use crate::router::{Router, RouterStats};
use crate::types::Prefix;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

const REQUEST_QUEUE_DEPTH: usize = 64;

type Job = Box<dyn FnOnce(&mut Router) + Send>;

enum Request {
    Run(Job),
    Shutdown(oneshot::Sender<RouterStats>),
}

pub struct RouterService {
    router: Router,
    requests: mpsc::Receiver<Request>,
}

impl RouterService {
    /// Moves `router` into a new task and returns the handle to reach it.
    /// Must be called from within a tokio runtime.
    pub fn spawn(router: Router) -> RouterHandle {
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
        let service = RouterService {
            router,
            requests: rx,
        };
        tokio::spawn(service.run());
        RouterHandle { requests: tx }
    }

    async fn run(self) {
        let RouterService {
            mut router,
            mut requests,
        } = self;
        info!("Router service started");

        while let Some(request) = requests.recv().await {
            match request {
                Request::Run(job) => job(&mut router),
                Request::Shutdown(reply) => {
                    let stats = router.teardown();
                    // Le demandeur peut avoir abandonné la réponse
                    let _ = reply.send(stats);
                    info!("Router service stopped on request");
                    return;
                }
            }
        }

        debug!("All router handles dropped");
        router.teardown();
    }
}

/// Cloneable handle to a running [`RouterService`].
#[derive(Clone)]
pub struct RouterHandle {
    requests: mpsc::Sender<Request>,
}

impl RouterHandle {
    async fn call<R, F>(&self, f: F) -> Result<R, RouterError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Router) -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |router| {
            let _ = tx.send(f(router));
        });
        self.requests
            .send(Request::Run(job))
            .await
            .map_err(|_| RouterError::ServiceStopped)?;
        rx.await.map_err(|_| RouterError::ServiceStopped)
    }

    pub async fn execute(&self, command: Command) -> Result<Vec<Output>, RouterError> {
        self.call(move |router| command.execute(router)).await?
    }

    pub async fn set_forwarding_rule(
        &self,
        prefix: Prefix,
        interface: Option<InterfaceId>,
    ) -> Result<bool, RouterError> {
        self.call(move |router| router.set_forwarding_rule(prefix, interface))
            .await?
    }

    pub async fn forward(&self, addr: u32, packet_id: u32) -> Result<ForwardingDecision, RouterError> {
        self.call(move |router| router.forward(addr, packet_id)).await
    }

    pub async fn forwarding_table(&self) -> Result<Vec<ForwardingEntry>, RouterError> {
        self.call(|router| router.forwarding_table().collect()).await
    }

    pub async fn process_routing_update(
        &self,
        update: RoutingUpdate,
    ) -> Result<Option<Advertisement>, RouterError> {
        self.call(move |router| router.process_routing_update(update))
            .await?
    }

    pub async fn stats(&self) -> Result<RouterStats, RouterError> {
        self.call(|router| router.stats()).await
    }

    /// Tears the router down and stops the service. Later requests on any
    /// clone of this handle fail with [`RouterError::ServiceStopped`].
    pub async fn shutdown(&self) -> Result<RouterStats, RouterError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(Request::Shutdown(tx))
            .await
            .map_err(|_| RouterError::ServiceStopped)?;
        rx.await.map_err(|_| RouterError::ServiceStopped)
    }
}
