//! Public API for the notification system
//!
//! External modules import from here rather than from the internal modules.

use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

pub use crate::notifications::error::{NotificationError, NotificationResult};
pub use crate::notifications::event::{
    DeviceEvent, DeviceEventType, Event, EventFilter, FrameEvent, FrameEventType, SessionEvent,
    SessionEventType,
};
pub use crate::notifications::manager::{AsyncNotificationManager, EventReceiver};
pub use crate::notifications::stats::SubscriberStatistics;

/// Shared handle to a notification manager
pub type NotificationService = Arc<Mutex<AsyncNotificationManager>>;

static NOTIFICATION_SERVICE: LazyLock<NotificationService> = LazyLock::new(|| {
    log::trace!("Initializing notification service");
    Arc::new(Mutex::new(AsyncNotificationManager::new()))
});

/// Lock the process-wide notification service
///
/// # Examples
/// ```no_run
/// # use listscan::notifications::api::{get_notification_service, EventFilter};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut manager = get_notification_service().await;
/// let _events = manager.subscribe("overlay".to_string(), EventFilter::All, "cli".to_string())?;
/// # Ok(())
/// # }
/// ```
pub async fn get_notification_service() -> tokio::sync::MutexGuard<'static, AsyncNotificationManager>
{
    NOTIFICATION_SERVICE.lock().await
}

/// The process-wide service, for injection into the session controller
pub fn get_notification_service_arc() -> NotificationService {
    Arc::clone(&NOTIFICATION_SERVICE)
}

/// A private service, for tests and embedders that want isolated event streams
pub fn new_notification_service() -> NotificationService {
    Arc::new(Mutex::new(AsyncNotificationManager::new()))
}
