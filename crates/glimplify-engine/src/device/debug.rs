use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Debug output sink for the device.
///
/// wgpu reports validation errors that happen outside an error scope to a
/// device-wide handler; the default handler panics. This one logs every
/// message and counts them so callers can check whether a frame was clean.
#[derive(Debug, Clone, Default)]
pub struct DebugOutput {
    errors: Arc<AtomicU64>,
}

impl DebugOutput {
    /// Installs the logging handler on `device`.
    pub fn install(device: &wgpu::Device) -> Self {
        let output = Self::default();
        let errors = Arc::clone(&output.errors);

        device.on_uncaptured_error(Arc::new(move |err: wgpu::Error| {
            errors.fetch_add(1, Ordering::Relaxed);
            log::error!("GPU CALLBACK: {} message = {}", error_kind(&err), err);
        }));

        log::debug!("gpu debug output enabled");
        output
    }

    /// Number of errors reported since installation.
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

fn error_kind(err: &wgpu::Error) -> &'static str {
    match err {
        wgpu::Error::Validation { .. } => "** VALIDATION ERROR **",
        wgpu::Error::OutOfMemory { .. } => "** OUT OF MEMORY **",
        wgpu::Error::Internal { .. } => "** INTERNAL ERROR **",
    }
}
