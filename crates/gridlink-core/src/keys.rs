//! Well-known relation data keys.

/// Symmetric auth token for peers. Controller application scope; written
/// only by the controller leader.
pub const SHARED_SECRET: &str = "shared_secret";

/// Controller network address. Controller application scope.
pub const CONTROLLER_HOST: &str = "controller_host";

/// Controller listen port. Controller application scope.
pub const CONTROLLER_PORT: &str = "controller_port";

/// Serialized partition metadata. Peer application scope.
pub const PARTITION_INFO: &str = "partition_info";

/// Serialized compute-node descriptor. Peer unit scope.
pub const INVENTORY: &str = "inventory";
