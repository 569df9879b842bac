pub mod client;
pub mod entities;

pub use client::{ApiClient, BotError, ColivingQuery};
pub use entities::{Coliving, Image, Location, PhotoSize, User, UserProfile};
