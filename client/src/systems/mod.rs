//! Client-side game systems

mod npc;
mod player;
mod rendering;
mod world;

pub use npc::*;
pub use player::*;
pub use rendering::*;
pub use world::*;
