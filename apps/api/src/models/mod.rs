pub mod bill;
pub mod joins;
pub mod party;
pub mod politician;
pub mod profile;
pub mod promise;
pub mod suggestion;
pub mod vote;
