pub mod webhook;

pub use webhook::WebhookDispatcher;
