pub mod alert;
pub mod button;

pub use alert::*;
pub use button::*;
