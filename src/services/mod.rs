//! Storemedia Services
//!
//! Validation, interaction, rendering, and persistence services.

pub mod binder;
pub mod interaction;
pub mod renderer;
pub mod storage;
pub mod upload;
pub mod urls;
pub mod validator;

pub use binder::{BindError, BoundRecord, MemoryRecordStore, OwnerRecordStore, PersistenceBinder};
pub use interaction::{DragPhase, InteractionController, ListenerGuard, PointerPoint};
pub use renderer::{AspectRatio, RenderInstructions};
pub use storage::{BucketPolicy, FsStorage, StorageError, StorageProvider, StoreOptions};
pub use upload::{UploadError, UploadPipeline};
pub use urls::{with_freshness_token, FreshnessOptions};
pub use validator::{AssetValidator, ValidationError, ValidationPolicy};
