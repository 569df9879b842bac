pub mod coliving;
pub mod location;
pub mod restrictions;
pub mod telegram_user;

pub use coliving::{Coliving, ColivingImage, RoomType};
pub use location::Location;
pub use telegram_user::{CreateTelegramUserRequest, TelegramUser};
