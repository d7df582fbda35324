// Vote ledger, feature toggles and the caller's own vote listing.

pub mod featured;
pub mod handlers;
pub mod ledger;
