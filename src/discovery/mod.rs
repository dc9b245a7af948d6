//! Two interchangeable discovery strategies feeding the registry: the
//! load-time builder/wrapper API (`decl`) and the source-scan surface
//! parser (`source_scan`). Both must produce equivalent registry contents
//! for the same input; the only permitted divergence is that source-scan
//! records textual type names where load-time may have inferred them from
//! real type objects.

pub mod decl;
pub mod source_scan;

pub use decl::{EntityDecl, OperationDecl};
