use std::sync::Arc;

use newsdesk_core::clock::{Clock, SystemClock};
use newsdesk_core::events::EventBus;
use newsdesk_core::recycle_bin::{RecycleBinService, RestoreRegistry, RetentionPolicy, SoftDeleteDispatcher};
use newsdesk_core::store::ContentStore;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    store: Arc<dyn ContentStore>,
    config: AppConfig,
    event_bus: EventBus,
    clock: Arc<dyn Clock>,
    dispatcher: SoftDeleteDispatcher,
    recycle_bin: RecycleBinService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        config: AppConfig,
        event_bus: EventBus,
        retention: RetentionPolicy,
    ) -> Self {
        let dispatcher = SoftDeleteDispatcher::new(store.clone(), retention, event_bus.clone());
        let recycle_bin =
            RecycleBinService::new(store.clone(), RestoreRegistry::standard(), event_bus.clone());
        Self {
            inner: Arc::new(InnerState {
                store,
                config,
                event_bus,
                clock: Arc::new(SystemClock),
                dispatcher,
                recycle_bin,
            }),
        }
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.inner.store.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    pub fn dispatcher(&self) -> &SoftDeleteDispatcher {
        &self.inner.dispatcher
    }

    pub fn recycle_bin(&self) -> &RecycleBinService {
        &self.inner.recycle_bin
    }
}
