//! Start/stop of server-side collection.

pub mod controller;

pub use controller::{CollectionAction, CollectionController};
