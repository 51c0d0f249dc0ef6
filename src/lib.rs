//! Album lightbox core: gallery index, viewport fitting and the lightbox
//! controller, plus the HTTP client for the album server they talk to.

pub mod api;
pub mod config;
pub mod error;
pub mod fit;
pub mod gallery;
pub mod lightbox;
pub mod logging;
pub mod tasks;

pub use error::{Error, Result};
pub use fit::{FitResult, Viewport, ViewportFitter};
pub use gallery::{Direction, GalleryIndex, MediaItem, MediaKind};
pub use lightbox::{KeyOutcome, Lightbox, LightboxEvent, LightboxKey, LightboxState, LightboxView};
