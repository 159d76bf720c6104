mod engine;
mod manager;
mod view;

pub use engine::SessionEngine;
pub use view::PROMPT_TITLE;
