//! Soft-delete lifecycle: a live document becomes a [`DeletedItem`] and later
//! either returns to its collection, is discarded, or expires.

pub mod dispatcher;
pub mod model;
pub mod restore;
pub mod service;
pub mod sweeper;

pub use dispatcher::SoftDeleteDispatcher;
pub use model::{
    BinFilter, BinStats, DeletedItem, EmptyRequest, Page, PageRequest, Pagination, PurgeFilter,
    RetentionPolicy, TypeStats,
};
pub use restore::{Reconstructor, RestoreRegistry};
pub use service::RecycleBinService;
pub use sweeper::ExpirySweeper;
