pub mod health;
pub mod queue;
pub mod referee;
pub mod validation;
pub mod ws;
