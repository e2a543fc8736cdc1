//! Shared fixtures: scripted connectors and an in-memory service harness

#![allow(dead_code)]

use aclgate_authority::{
    AclService, AuthorityCatalog, EngineConfig, MappingCatalog, StaticRegistry, WorkerPool,
};
use aclgate_core::{
    AuthorityConnector, AuthorizationResponse, BackendDescriptor, ConnectorError,
    MappingConnector, UserRecord,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a scripted connector did, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started { name: String, user: UserRecord },
    Finished { name: String },
}

#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
    in_flight: Mutex<HashMap<String, (usize, usize)>>,
}

impl Recorder {
    fn start(&self, name: &str, user: &UserRecord) {
        self.events.lock().unwrap().push(Event::Started {
            name: name.to_string(),
            user: user.clone(),
        });
        let mut in_flight = self.in_flight.lock().unwrap();
        let entry = in_flight.entry(name.to_string()).or_default();
        entry.0 += 1;
        entry.1 = entry.1.max(entry.0);
    }

    fn finish(&self, name: &str) {
        if let Some(entry) = self.in_flight.lock().unwrap().get_mut(name) {
            entry.0 -= 1;
        }
        self.events.lock().unwrap().push(Event::Finished {
            name: name.to_string(),
        });
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Identities `name` was invoked with
    pub fn inputs(&self, name: &str) -> Vec<UserRecord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started { name: n, user } if n == name => Some(user),
                _ => None,
            })
            .collect()
    }

    /// Position of the first `Started` event for `name`
    pub fn started_at(&self, name: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| matches!(e, Event::Started { name: n, .. } if n == name))
    }

    /// Position of the first `Finished` event for `name`
    pub fn finished_at(&self, name: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| matches!(e, Event::Finished { name: n } if n == name))
    }

    /// Most invocations of `name` ever running at once
    pub fn peak_concurrency(&self, name: &str) -> usize {
        self.in_flight
            .lock()
            .unwrap()
            .get(name)
            .map(|(_, peak)| *peak)
            .unwrap_or(0)
    }
}

#[derive(Clone)]
pub enum AuthorityScript {
    Answer(AuthorizationResponse),
    Fail(ConnectorError),
    Panic,
}

pub struct ScriptedAuthority {
    name: String,
    script: AuthorityScript,
    delay: Duration,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl AuthorityConnector for ScriptedAuthority {
    async fn authorize(&self, user: &UserRecord) -> Result<AuthorizationResponse, ConnectorError> {
        self.recorder.start(&self.name, user);
        tokio::time::sleep(self.delay).await;
        self.recorder.finish(&self.name);
        match &self.script {
            AuthorityScript::Answer(response) => Ok(response.clone()),
            AuthorityScript::Fail(err) => Err(err.clone()),
            AuthorityScript::Panic => panic!("scripted authority '{}' panicked", self.name),
        }
    }
}

pub type Rewrite = Arc<dyn Fn(&UserRecord) -> UserRecord + Send + Sync>;

#[derive(Clone)]
pub enum MapperScript {
    Rewrite(Rewrite),
    Fail(ConnectorError),
}

impl MapperScript {
    /// Append `suffix` to the leaf user name
    pub fn suffix(suffix: &str) -> Self {
        let suffix = suffix.to_string();
        MapperScript::Rewrite(Arc::new(move |user: &UserRecord| {
            user.with_user(format!("{}{}", user.user(), suffix))
        }))
    }

    pub fn rewrite<F>(f: F) -> Self
    where
        F: Fn(&UserRecord) -> UserRecord + Send + Sync + 'static,
    {
        MapperScript::Rewrite(Arc::new(f))
    }
}

pub struct ScriptedMapper {
    name: String,
    script: MapperScript,
    delay: Duration,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl MappingConnector for ScriptedMapper {
    async fn map_user(&self, user: &UserRecord) -> Result<UserRecord, ConnectorError> {
        self.recorder.start(&self.name, user);
        tokio::time::sleep(self.delay).await;
        self.recorder.finish(&self.name);
        match &self.script {
            MapperScript::Rewrite(f) => Ok(f(user)),
            MapperScript::Fail(err) => Err(err.clone()),
        }
    }
}

/// A running service over scripted connectors
pub struct Harness {
    pub service: Arc<AclService>,
    pub mapping_pool: WorkerPool<UserRecord>,
    pub authority_pool: WorkerPool<AuthorizationResponse>,
    pub recorder: Arc<Recorder>,
    /// Mapping connections as registered
    pub mappers: Vec<BackendDescriptor>,
}

impl Harness {
    pub async fn shutdown(&self) {
        self.mapping_pool.shutdown().await;
        self.authority_pool.shutdown().await;
    }
}

pub struct HarnessBuilder {
    authorities: Vec<BackendDescriptor>,
    mappers: Vec<BackendDescriptor>,
    authority_catalog: AuthorityCatalog,
    mapping_catalog: MappingCatalog,
    recorder: Arc<Recorder>,
    config: EngineConfig,
    workers: usize,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            authorities: Vec::new(),
            mappers: Vec::new(),
            authority_catalog: AuthorityCatalog::new(),
            mapping_catalog: MappingCatalog::new(),
            recorder: Arc::new(Recorder::default()),
            config: EngineConfig::default(),
            workers: 10,
        }
    }
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authority(self, name: &str, script: AuthorityScript) -> Self {
        self.authority_with(BackendDescriptor::new(name, name), script, Duration::ZERO)
    }

    /// Register an authority; its class name doubles as the connector's name
    pub fn authority_with(
        mut self,
        descriptor: BackendDescriptor,
        script: AuthorityScript,
        delay: Duration,
    ) -> Self {
        let connector = Arc::new(ScriptedAuthority {
            name: descriptor.name.clone(),
            script,
            delay,
            recorder: self.recorder.clone(),
        });
        self.authority_catalog
            .register(descriptor.class_name.clone(), move |_| {
                Ok(connector.clone() as Arc<dyn AuthorityConnector>)
            });
        self.authorities.push(descriptor);
        self
    }

    pub fn mapper(self, name: &str, prerequisites: &[&str], script: MapperScript) -> Self {
        self.mapper_with(name, prerequisites, script, Duration::ZERO)
    }

    pub fn mapper_with(
        mut self,
        name: &str,
        prerequisites: &[&str],
        script: MapperScript,
        delay: Duration,
    ) -> Self {
        let descriptor = prerequisites
            .iter()
            .fold(BackendDescriptor::new(name, name), |d, p| d.with_prerequisite(*p));
        let connector = Arc::new(ScriptedMapper {
            name: name.to_string(),
            script,
            delay,
            recorder: self.recorder.clone(),
        });
        self.mapping_catalog.register(name, move |_| {
            Ok(connector.clone() as Arc<dyn MappingConnector>)
        });
        self.mappers.push(descriptor);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn build(self) -> Harness {
        let mappers = self.mappers.clone();
        let registry = StaticRegistry::new(self.authorities, self.mappers).unwrap();
        let mapping_pool =
            WorkerPool::<UserRecord>::start("mapping", self.workers, Arc::new(self.mapping_catalog));
        let authority_pool = WorkerPool::<AuthorizationResponse>::start(
            "authority",
            self.workers,
            Arc::new(self.authority_catalog),
        );
        let service = AclService::new(
            Arc::new(registry),
            mapping_pool.queue(),
            authority_pool.queue(),
            self.config,
        );

        Harness {
            service: Arc::new(service),
            mapping_pool,
            authority_pool,
            recorder: self.recorder,
            mappers,
        }
    }
}

pub fn authorized(tokens: &[&str]) -> AuthorityScript {
    AuthorityScript::Answer(AuthorizationResponse::authorized(tokens.iter().copied()))
}
