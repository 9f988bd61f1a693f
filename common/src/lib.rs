//! Substation Intake Common Library
//!
//! CLIとWeb(WASM)で共有される命名規則・分類器・型定義

pub mod category;
pub mod taxonomy;
pub mod classifier;
pub mod batch;
pub mod record;
pub mod store;
pub mod memory;
pub mod gallery;
pub mod intake;
pub mod error;

pub use category::{Category, category_display_style};
pub use taxonomy::{AllowedFileKind, FileKind, TaxonomyEntry, TaxonomyTable};
pub use classifier::{
    Classifier, DuplicateScope, MalformedName, ParsedFilename, RejectionReason,
    detect_file_kind, format_item_type, is_valid_file_type, is_valid_naming_format,
    parse_image_filename,
};
pub use batch::{AcceptedCandidate, BatchOutcome, BatchPolicy, RejectedCandidate, UploadCandidate, validate_batch};
pub use record::{ImageRecord, NewImageRecord};
pub use store::{AuthProvider, FileStore, Locator, MetadataStore, OwnerId};
pub use gallery::{GalleryFilter, category_counts, filter_records, group_by_category};
pub use intake::{FailedUpload, IntakeService, UploadFile, UploadReport};
pub use error::{Error, Result};
