pub mod archive;
pub mod handlers;
pub mod ingest;

pub use archive::{DocumentArchive, MemoryArchive, S3Archive};
pub use ingest::{BatchReport, Ingestor, UploadedFile};
