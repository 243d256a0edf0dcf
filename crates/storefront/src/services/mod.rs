//! Clients for third-party services the site proxies.
//!
//! # Services
//!
//! - `mailerlite` - Newsletter subscriptions
//! - `youtube` - Latest and most popular channel videos (cached)

pub mod mailerlite;
pub mod youtube;

pub use mailerlite::{MailerLiteClient, MailerLiteError, Subscriber};
pub use youtube::{VideoFeed, YouTubeClient, YouTubeError, YouTubeVideo};
