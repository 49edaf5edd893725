pub mod dialogue;
pub mod terminal;
