use std::sync::Arc;

use ddlshelf_core::{
    AddonService, Authenticator, Config, LinkIntake, MediaStore, MetadataResolver, Registrar,
    SanitizedConfig, SizeProbe,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn MediaStore>,
    registrar: Registrar,
    addon: AddonService,
    intake: LinkIntake,
}

impl AppState {
    /// Wire the services around one store handle.
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn MediaStore>,
        resolver: Arc<dyn MetadataResolver>,
        probe: Arc<dyn SizeProbe>,
    ) -> Self {
        let registrar = Registrar::new(Arc::clone(&store), config.registration.dedup_key);
        let addon = AddonService::new(Arc::clone(&store), config.addon.clone());
        let intake = LinkIntake::new(resolver, probe);

        Self {
            config,
            authenticator,
            store,
            registrar,
            addon,
            intake,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn store(&self) -> &dyn MediaStore {
        self.store.as_ref()
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    pub fn addon(&self) -> &AddonService {
        &self.addon
    }

    pub fn intake(&self) -> &LinkIntake {
        &self.intake
    }

    /// Extra attempts allowed when a registration loses a write race.
    pub fn max_conflict_retries(&self) -> u32 {
        self.config.registration.max_conflict_retries
    }
}
