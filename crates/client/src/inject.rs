//! Seam through which loaded assets reach the host UI.

/// Receives the current version's initial assets, already versioned to their
/// physical names, whenever a synchronization round settles on a current
/// configuration. The host implementation turns these into script/link
/// includes; this crate never touches the UI itself.
pub trait AssetInjector {
    fn inject(&mut self, assets: &[String]);
}

/// Default injector that only records the load in the log stream.
#[derive(Debug, Default)]
pub struct LogInjector;

impl AssetInjector for LogInjector {
    fn inject(&mut self, assets: &[String]) {
        tracing::info!(?assets, "loading initial assets");
    }
}
