pub mod import_service;
pub mod import_service_impl;
pub use import_service::{ImportError, ImportService, ImportSummary};
pub use import_service_impl::SeaOrmImportService;

pub mod query_service;
pub mod query_service_impl;
pub use query_service::{
    IssueSelector, Page, PreviousEntry, QueryError, QueryService, RankingDto, RankingQuery,
    RankingWithContext, SongDetail, SongDto, VideoDto,
};
pub use query_service_impl::{SeaOrmQueryService, normalize_paging};

pub mod scheduler;
pub use scheduler::Scheduler;
