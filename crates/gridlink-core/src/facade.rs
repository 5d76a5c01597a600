//! Collaborator contracts consumed by the handshake core.
//!
//! The controller host application is reached only through these narrow
//! traits, keeping installation, secret generation, and leader election
//! outside the core.

/// Narrow facade over the controller host application.
pub trait ControllerFacade: Send + Sync {
    /// Whether the controller software has been installed.
    fn is_installed(&self) -> bool;

    /// Whether the downstream accounting service is ready.
    fn dependency_ready(&self) -> bool;

    /// The shared authentication secret to distribute to peers.
    fn shared_secret(&self) -> String;

    /// Advertised controller hostname.
    fn hostname(&self) -> String;

    /// Advertised controller port.
    fn port(&self) -> u16;
}

/// Capability reporting whether the local unit currently holds application
/// leadership.
///
/// Injected rather than read ambiently so the reconciler stays pure and
/// testable. The host guarantees single-writer leadership at any instant.
pub trait Leadership: Send + Sync {
    /// True when the local unit is the group leader.
    fn is_leader(&self) -> bool;
}

/// Fixed leadership answer, for single-unit deployments and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticLeadership(pub bool);

impl Leadership for StaticLeadership {
    fn is_leader(&self) -> bool {
        self.0
    }
}
