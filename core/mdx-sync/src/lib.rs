//! Bidirectional sync between the MDX25 local database and Supabase.
//!
//! # Components
//!
//! - **Stores**: [`RecordStore`] over each backing database ([`LocalStore`],
//!   [`SupabaseStore`]) plus [`MemoryStore`] for dry runs
//! - **Transcoder**: rewrites field names and date encodings between the
//!   stores' conventions
//! - **Comparator**: decides whether a destination record needs overwriting
//! - **Table synchronizer**: reconciles one table
//! - **Orchestrator**: runs the synchronizer across every configured table
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mdx_sync::{MemoryStore, SyncConfig, SyncOrchestrator};
//!
//! let orchestrator = SyncOrchestrator::new(
//!     Arc::new(MemoryStore::local()),
//!     Arc::new(MemoryStore::remote()),
//!     SyncConfig::default(),
//! )
//! .unwrap();
//! assert_eq!(orchestrator.config().tables.len(), 17);
//! ```

pub mod compare;
mod config;
pub mod conflict;
mod error;
mod local;
mod memory;
mod orchestrator;
pub mod status;
pub mod store;
mod supabase;
pub mod table_sync;
pub mod transcode;

pub use config::SyncConfig;
pub use conflict::ConflictPolicy;
pub use error::{SyncError, SyncResult};
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use orchestrator::{SyncOrchestrator, SyncRun, SyncSummary};
pub use status::{check_status, OverallStatus, StatusReport, TableState, TableStatus};
pub use store::{RecordStore, StoreSide};
pub use supabase::{SupabaseConfig, SupabaseStore};
pub use table_sync::{SyncDirection, TableSyncResult, TableSynchronizer};
