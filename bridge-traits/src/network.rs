//! Connectivity Abstraction
//!
//! Provides the online/offline signal consumed by the sync core.

/// Connectivity monitor trait
///
/// A thin wrapper over the platform connectivity flag (`navigator.onLine`,
/// NetworkManager, ConnectivityManager, ...). The sync core reads it at the
/// start of every sync cycle to defer work while offline.
///
/// # Example
///
/// ```
/// use bridge_traits::network::ConnectivityMonitor;
///
/// struct AlwaysOnline;
///
/// impl ConnectivityMonitor for AlwaysOnline {
///     fn is_online(&self) -> bool {
///         true
///     }
/// }
///
/// assert!(AlwaysOnline.is_online());
/// ```
pub trait ConnectivityMonitor: Send + Sync {
    /// Whether the platform currently reports network connectivity.
    ///
    /// This is advisory: a `true` here does not guarantee the cloud backend
    /// is reachable, only that the platform believes it has a route.
    fn is_online(&self) -> bool;
}
