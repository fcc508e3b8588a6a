use std::{collections::HashMap, time::Duration};
use tracing::{error, info, warn};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Instant},
};
use uuid::Uuid;

use crate::actors::{Actor, ActorType, ControlMessage};

pub type ActorFactory = Box<dyn Fn() -> Box<dyn Actor> + Send + Sync>;

pub struct Supervisor {
    actor_factories: HashMap<ActorType, ActorFactory>,
    /// Live incarnation of each actor type; messages from older incarnations are ignored.
    incarnations: HashMap<Uuid, ActorType>,
    pulses: HashMap<ActorType, Instant>,
    handles: HashMap<ActorType, JoinHandle<()>>,
    check_interval: Duration,
    dead_timeout: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(1), Duration::from_secs(3))
    }

    pub fn with_timeouts(check_interval: Duration, dead_timeout: Duration) -> Self {
        Self {
            actor_factories: HashMap::new(),
            incarnations: HashMap::new(),
            pulses: HashMap::new(),
            handles: HashMap::new(),
            check_interval,
            dead_timeout,
        }
    }

    pub fn register_actor(&mut self, actor_type: ActorType, factory: ActorFactory) {
        self.actor_factories.insert(actor_type, factory);
    }

    /// Runs until `shutdown_rx` flips, then aborts whatever is still running.
    pub async fn start(&mut self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut check_interval = time::interval(self.check_interval);

        let (supervisor_tx, mut supervisor_rx) = mpsc::channel::<ControlMessage>(512);

        let actors: Vec<ActorType> = self.actor_factories.keys().copied().collect();
        actors.into_iter().for_each(|actor| {
            self.spawn_actor(actor, supervisor_tx.clone());
        });

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                Some(msg) = supervisor_rx.recv() => {
                    match msg {
                        ControlMessage::Heartbeat(id) => {
                            if let Some(actor_type) = self.incarnations.get(&id) {
                                self.pulses.insert(*actor_type, Instant::now());
                            }
                        }
                        ControlMessage::Shutdown(id) => {
                            if let Some(actor_type) = self.incarnations.remove(&id) {
                                info!("{:?} shut down.", actor_type);
                                self.pulses.remove(&actor_type);
                                self.handles.remove(&actor_type);
                            }
                        },
                        ControlMessage::Error(id, error_msg) => {
                            if let Some(actor_type) = self.incarnations.get(&id) {
                                error!("Actor {:?} reported error: {}", actor_type, error_msg);
                                self.pulses.insert(*actor_type, Instant::now());
                            }
                        },
                    }
                }

                _ = check_interval.tick() => {
                    let Some(dead_line) = Instant::now().checked_sub(self.dead_timeout) else {
                        continue;
                    };

                    let dead_actors: Vec<ActorType> = self
                        .pulses
                        .iter()
                        .filter(|&(_, &pulse)| pulse < dead_line)
                        .map(|(actor_type, _)| *actor_type)
                        .collect();

                    dead_actors.into_iter().for_each(|actor_type| {
                        warn!("{:?} is unresponsive! Restarting.", actor_type);
                        if let Some(handle) = self.handles.remove(&actor_type) {
                            handle.abort();
                        }
                        self.spawn_actor(actor_type, supervisor_tx.clone());
                    });
                }

                _ = shutdown_rx.changed() => break,
            }
        }

        info!("Supervisor stopping {} actors", self.handles.len());
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
        self.pulses.clear();
        self.incarnations.clear();
    }

    fn spawn_actor(&mut self, actor_type: ActorType, tx: mpsc::Sender<ControlMessage>) {
        let Some(factory) = self.actor_factories.get(&actor_type) else {
            return;
        };
        let mut new_actor = factory();
        let id = new_actor.id();

        self.incarnations.retain(|_, t| *t != actor_type);
        self.incarnations.insert(id, actor_type);

        let new_actor_handle = tokio::spawn(async move {
            if let Err(e) = new_actor.run(tx).await {
                error!("Actor {:?} crashed: {}", actor_type, e);
            }
        });
        self.handles.insert(actor_type, new_actor_handle);
        self.pulses.insert(actor_type, Instant::now());
    }
}
