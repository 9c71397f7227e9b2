/// State management module
///
/// This module handles all viewfinder state, including:
/// - Lens, body and aspect ratio catalogs (catalog.rs)
/// - The viewfinder state record (viewfinder.rs)
/// - Camera selection and zoom transitions (controller.rs)
/// - Settings loaded from the config directory (settings.rs)

pub mod catalog;
pub mod controller;
pub mod settings;
pub mod viewfinder;
