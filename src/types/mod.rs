pub mod candle;
pub mod indicators;
pub mod levels;
pub mod signals;

pub use candle::*;
pub use indicators::*;
pub use levels::*;
pub use signals::*;
