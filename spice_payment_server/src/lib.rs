//! # SPG server
//! This crate hosts the HTTP server for the spice payment gateway. It is responsible for:
//! * Receiving payment webhooks from InfinitePay, PagSeguro and Asaas and turning them into confirmations.
//! * Exposing the periodic verification sweep, both as an endpoint and as a scheduled worker.
//! * Accepting bank statements (JSON or CSV) for reconciliation against pending orders.
//! * Sending payment notifications (email and WhatsApp) once an order is paid.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /verify-pending-payments`: Runs the periodic verifier over all pending orders.
//! * `POST /process-bank-statement`, `POST /process-bank-statement/csv`: Bank statement reconciliation.
//! * `GET /orders/{order_nsu}`, `POST /orders/{order_nsu}/confirm`: Order lookup and manual confirmation.
//! * `POST /webhook/{infinitepay,pagseguro,asaas}`: Gateway payment notifications.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod verification_worker;

#[cfg(test)]
mod endpoint_tests;
