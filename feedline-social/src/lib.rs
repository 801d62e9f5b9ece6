//! Social network clients used by feedline.
//!
//! Only the X (Twitter) pipeline is implemented: an authenticated timeline client and
//! the renderer that turns its posts into feed items.
pub mod twitter;
