pub mod dialogue;
pub mod tmx;

pub use dialogue::load_dialogue;
pub use tmx::load_level;
