pub mod assets;
pub mod create;
pub mod get;
pub mod raw;

pub use assets::asset_handler;
pub use create::create_handler;
pub use get::get_handler;
pub use raw::raw_handler;
