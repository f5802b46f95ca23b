//! Domain types shared by the selector, validation and submission pipeline.

pub mod contact;
pub mod directory;
pub mod visit;

pub use contact::{ContactKind, ContactSelection, ContactSnapshot, KnownContact, NewContact};
pub use directory::{CoVisitor, Identity, Site};
pub use visit::{Coordinates, Resolved, VisitDraft, VisitRecord};
