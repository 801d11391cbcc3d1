//! UI Components

pub mod loading;
pub mod post_card;
pub mod post_grid;

pub use loading::Loading;
pub use post_card::PostCard;
pub use post_grid::PostGrid;
