// numslider - Library exports for the host binary and tests

pub mod config;
pub mod connection;
pub mod logging;
pub mod messaging;
pub mod project;
pub mod sequencer;
pub mod session;
pub mod speech;
pub mod store;

// Re-export commonly used types for convenience
pub use config::{AppConfig, ConfigError, SpeechConfig};
pub use connection::{AtomicStoreStatus, StoreStatus};
pub use messaging::{Notification, NotificationSender, create_notification_channel};
pub use project::{ActiveProjectCache, Project, ProjectId, ProjectStatus, SessionContext, UserContext};
pub use sequencer::{PlayerError, PlayerState, SequenceDescriptor, SequencePlayer};
pub use session::{PlaybackSnapshot, PlayerSession, SessionHandle, SessionOptions};
pub use speech::Announcer;
pub use store::{
    HttpBackend, MemoryStore, ProgressStore, ProjectSource, StoreError, fetch_with_cache,
};
