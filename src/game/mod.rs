pub mod clock;
pub mod moves;
pub mod outcome;
pub mod rules;
pub mod session;
pub mod utils;
