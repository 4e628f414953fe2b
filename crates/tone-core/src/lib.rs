pub mod constants;
pub mod export;
pub mod gate;
pub mod pan;
pub mod params;
pub mod player;
pub mod preview;
pub mod render;
pub mod wav;

pub use constants::*;
pub use export::*;
pub use gate::*;
pub use pan::*;
pub use params::*;
pub use player::*;
pub use preview::*;
pub use render::*;
pub use wav::*;
