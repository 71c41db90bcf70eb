pub mod chat;
pub mod prices;
pub mod token;
