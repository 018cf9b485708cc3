mod helpers;
mod mocks;

mod orders;
mod reconciliation;
mod verification;
