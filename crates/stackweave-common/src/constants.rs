//! Workspace-wide constants: artifact key vocabulary, route priorities,
//! and default paths.

/// Artifact key for the backend API invocation URL.
pub const KEY_API_URL: &str = "api_url";

/// Artifact key for the identity pool id.
pub const KEY_IDENTITY_POOL_ID: &str = "identity_pool_id";

/// Artifact key for the identity application client id.
pub const KEY_IDENTITY_CLIENT_ID: &str = "identity_client_id";

/// Artifact key for the static-asset storage location.
pub const KEY_ASSET_BUCKET: &str = "asset_bucket";

/// Artifact key for the build-artifact storage location.
pub const KEY_ARTIFACT_BUCKET: &str = "artifact_bucket";

/// Artifact keys that must be present in every emitted artifact.
pub const REQUIRED_ARTIFACT_KEYS: [&str; 4] = [
    KEY_API_URL,
    KEY_IDENTITY_POOL_ID,
    KEY_IDENTITY_CLIENT_ID,
    KEY_ASSET_BUCKET,
];

/// Priority assigned to API path-prefix routes. Lower values evaluate first.
pub const ROUTE_PRIORITY_API: u32 = 100;

/// Priority of the implicit catch-all static-content route.
pub const ROUTE_PRIORITY_CATCH_ALL: u32 = 1000;

/// Path pattern of the implicit catch-all route.
pub const CATCH_ALL_PATTERN: &str = "/*";

/// Storage-node property selecting which artifact key its bucket feeds.
pub const PROP_STORAGE_PURPOSE: &str = "purpose";

/// `purpose` value marking the static-asset bucket.
pub const PURPOSE_ASSETS: &str = "assets";

/// `purpose` value marking the build-artifact bucket.
pub const PURPOSE_ARTIFACTS: &str = "artifacts";

/// Default manifest file name looked up by the CLI.
pub const DEFAULT_MANIFEST: &str = "stack.yaml";

/// Prefix for environment-variable fallbacks of context settings.
pub const ENV_PREFIX: &str = "STACKWEAVE_";

/// Application name used in CLI output and the emission envelope.
pub const APP_NAME: &str = "stackweave";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "weave";
