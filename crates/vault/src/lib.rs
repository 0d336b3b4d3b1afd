pub mod ingest;
pub mod locks;
pub mod organize;
pub mod playlist;
pub mod resolve;
pub mod roots;

pub use ingest::{ingest_archive, IngestError, IngestReport};
pub use organize::{OrganizeOutcome, VaultWriter};
pub use playlist::LinkOutcome;
pub use resolve::{sanitize_username, Resolved, ResolveError, Resolver, RootKind};
pub use roots::Roots;
