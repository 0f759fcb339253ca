pub mod addon;
pub mod auth;
pub mod config;
pub mod intake;
pub mod media;
pub mod resolver;
pub mod testing;

pub use addon::{AddonService, CatalogExtra, ContentType, ProtocolId};
pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, NoneAuthenticator, Principal,
};
pub use config::{
    config_path, load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use intake::{LinkIntake, PreparedLink};
pub use media::{
    DedupKey, MediaDocument, MediaError, MediaIdentity, MediaStore, MediaType, MergeChange,
    Registrar, Registration, SqliteMediaStore,
};
pub use resolver::{
    HttpSizeProbe, MetadataResolver, SizeProbe, SizeReport, TmdbResolver, UnconfiguredResolver,
};
