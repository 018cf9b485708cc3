mod admin_key;
mod webhook_auth;

pub use admin_key::{AdminApiKey, AdminKeyMiddlewareFactory, AdminKeyMiddlewareService, ADMIN_KEY_HEADER};
pub use webhook_auth::{WebhookAuthMiddlewareFactory, WebhookAuthMiddlewareService};
