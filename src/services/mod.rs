// Application services built on the storage traits
pub mod account_eraser;
pub mod content_service;
pub mod detail_fetcher;
pub mod drafts;
pub mod gallery;
pub mod preview_registry;
pub mod profile_aggregator;
pub mod social;
pub mod toc;
pub mod uploads;

pub use account_eraser::{AccountEraser, ErasureReport, TableOutcome, DELETE_CONFIRMATION};
pub use content_service::{ContentService, DownloadTicket};
pub use detail_fetcher::{DetailFetcher, DetailPolicy, RETRIES_LEFT_HEADER};
pub use drafts::{AutosaveStatus, AutosaveTracker, DraftInput, DraftService, DraftView};
pub use gallery::{available_tags, filter_by_tags, GalleryService};
pub use preview_registry::{Preview, PreviewRegistry, PreviewStats};
pub use profile_aggregator::{ProfileAggregator, ProfileView};
pub use social::SocialService;
pub use toc::{extract_toc, TocEntry};
pub use uploads::UploadService;
