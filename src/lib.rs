// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod portfolio;
pub mod render;
pub mod session;
pub mod storage;
pub mod types;

mod observability;

// Re-exports
pub use backend::{AuthBackend, ChatBackend, LedgerBackend};
pub use client::{API_URL_ENV, AurumClient, DEFAULT_API_URL};
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use portfolio::{
    DashboardSummary, NOTICE_TTL, Notice, NoticeBoard, NoticeKind, Portfolio, format_amount,
    parse_amount,
};
pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use types::*;
