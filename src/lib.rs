//! # Tether
//!
//! Alternate relations and batched eager loading for data-mapper repositories.
//!
//! Tether provides:
//! - A per-model relation registry with native and alternate relations
//! - Relations the host mapper cannot express (foreign key on the "many"
//!   side, targets on another backend, custom key derivation)
//! - One query per alternate relation for a whole result set, never one per record
//! - Override and reset of relation options at initialization time
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tether::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QueryError> {
//!     let config = TetherConfig::from_file("tether.toml")?;
//!     let connection = Arc::new(
//!         Connection::builder(engine)
//!             .config(config)
//!             .model(ModelRef::new("Post"))
//!             .model(ModelRef::new("Comment").on_connection("archive"))
//!             .route("archive", archive_engine)
//!             .build(),
//!     );
//!
//!     let posts = Repository::new(ModelRef::new("Post"), connection);
//!     posts.bind(
//!         RelationKind::HasMany,
//!         "Comments",
//!         RelationConfig::new().to("Comment").alternate().key("post_id"),
//!     )?;
//!
//!     let rows = posts
//!         .find_all(FindQuery::all().with(WithEntry::nested("Comments", json!({"limit": 20}))))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use tether_query::*;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tether_query::prelude::*;
    pub use tether_query::{Binding, RelationLookup, TetherConfig};
}
