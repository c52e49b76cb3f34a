pub mod delivery;
pub mod inventory;
pub mod pagination;
pub mod product;
pub mod user;

pub use pagination::PageInfo;
pub use user::{CurrentUser, UserProfile};
