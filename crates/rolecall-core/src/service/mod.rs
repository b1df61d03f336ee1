//! Character services built on the repository and transport ports.
//!
//! - `store` -- `CharacterStore`, uniqueness and ownership rules
//! - `builder` -- `CharacterBuilder`, the interactive create flow
//! - `editor` -- `CharacterEditor`, single-attribute edits
//! - `roster` -- listing and sheet views

pub mod builder;
pub mod editor;
pub mod roster;
pub mod store;

pub use builder::CharacterBuilder;
pub use editor::CharacterEditor;
pub use store::CharacterStore;
