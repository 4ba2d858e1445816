pub mod event;
pub mod pricing;
pub mod ticket;
pub mod user;

pub use event::Event;
pub use pricing::{FoodOption, NewPricingTier, PaymentMethod, PricingTier, PricingTierUpdate};
pub use ticket::{NewTicket, Ticket};
pub use user::{Role, Volunteer};
