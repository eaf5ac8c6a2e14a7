pub mod card_delivery;
pub mod conversations;
