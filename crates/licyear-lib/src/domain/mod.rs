pub mod blob;
pub mod hosting;
pub mod repository;
pub mod year;

pub use blob::{FileBlob, RevisionToken};
pub use hosting::{HostingApi, LocalSync};
pub use repository::RepositoryRef;
pub use year::{Year, YearError, has_copyright_notice, rewrite_year};
