pub mod collection;
pub mod config;
pub mod error;
pub mod events;
pub mod render;
pub mod processing {
    pub mod layout;
    pub mod thumbnails;
}
pub mod tasks {
    pub mod documents;
    pub mod presenter;
}

pub use error::Error;
