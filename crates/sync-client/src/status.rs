use liftsync_core::sync::SyncSeverity;

/// Receives `(message, severity)` notifications from a sync session.
///
/// Rendering is up to the host; [`SyncSeverity::auto_dismiss`] tells it which
/// messages may disappear on their own.
pub trait SyncStatusSink: Send + Sync {
    fn notify(&self, message: &str, severity: SyncSeverity);
}

impl<F> SyncStatusSink for F
where
    F: Fn(&str, SyncSeverity) + Send + Sync,
{
    fn notify(&self, message: &str, severity: SyncSeverity) {
        self(message, severity)
    }
}
