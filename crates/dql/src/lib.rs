//! Core domain for the Ditto Edge client.
//!
//! This crate contains the DQL statement builders, newtype identifiers, shared
//! value types, error types, and the port traits that infrastructure crates
//! implement. It never performs I/O itself.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate defines *what* a Ditto
//! Edge client does; `edge-client` (HTTP) and `containers` (docker CLI) define
//! *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`query`] | DQL builders (`build_select`, `build_insert`, `build_update`, ...) |
//! | [`identifiers`] | Newtype identifiers (`ContainerName`, `ImageName`, `RequestId`, ...) |
//! | [`types`] | Shared value types (`Query`, `ListOptions`, `ContainerState`, `StatusReport`, ...) |
//! | [`errors`] | Validation, container, and top-level client errors |
//! | [`ports`] | `ContainerRunner` and `DocumentService` traits |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod query;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{BoxError, ContainerError, EdgeError, QueryError};
pub use identifiers::{ComposeService, ContainerName, ImageName, RequestId};
pub use ports::{ContainerRunner, DocumentService};
pub use query::{
    build_delete_all, build_delete_by_id, build_get_by_id, build_insert, build_select,
    build_update, escape_ident, escape_string,
};
pub use types::{
    ContainerOptions, ContainerReport, ContainerState, Document, Filters, HttpProbe, ListOptions,
    Patch, Query, QueryArgs, Record, SortOrder, SortSpec, StatusReport, Timestamp,
};
