//! Tjänster för GCG Hub
//!
//! Lager (stores) per domän, händelser mellan dem och navet `GcgHub` som
//! håller ihop årscykeln. Här finns också poängberäkning, framsteg,
//! skanning av dokumentkatalogen och import av gammal webbläsardata.

pub mod scoring;
pub mod events;
pub mod request_guard;
pub mod editing;
pub mod year_store;
pub mod structure_store;
pub mod checklist_store;
pub mod assignment_store;
pub mod file_store;
pub mod document_store;
pub mod aoi_store;
pub mod assessment_sheet;
pub mod progress;
pub mod session;
pub mod file_scanner;
pub mod legacy_import;
pub mod hub;

pub use aoi_store::AoiStore;
pub use assessment_sheet::AssessmentSheet;
pub use assignment_store::{AssignmentKey, AssignmentStore};
pub use checklist_store::ChecklistStore;
pub use document_store::DocumentStore;
pub use editing::{EditableRow, RowState, SaveAction};
pub use events::{EventBus, HubEvent, SubscriptionId};
pub use file_scanner::{FileScanService, ScanResult};
pub use file_store::FileStore;
pub use hub::{GcgHub, YearRemoval};
pub use legacy_import::{ImportPreview, ImportResult, LegacyImportService};
pub use progress::{AspectProgress, Progress, ProgressLevel, UnitProgress, YearProgress};
pub use request_guard::{RequestGuard, RequestToken};
pub use session::{SessionKey, SessionStore};
pub use structure_store::StructureStore;
pub use year_store::{YearScoped, YearStore};
