//! Entity to wire-type mapping. Password hashes never leave this crate.

use warbler_db::{Message, User};
use warbler_types::models::{MessageView, UserProfile, UserSummary};

pub fn profile(user: &User) -> UserProfile {
    UserProfile {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        image_url: user.image_url.clone(),
        header_image_url: user.header_image_url.clone(),
        bio: user.bio.clone(),
        location: user.location.clone(),
    }
}

pub fn summary(user: &User) -> UserSummary {
    UserSummary {
        id: user.id,
        username: user.username.clone(),
        image_url: user.image_url.clone(),
        bio: user.bio.clone(),
    }
}

pub fn message(msg: &Message) -> MessageView {
    MessageView {
        id: msg.id,
        text: msg.text.clone(),
        timestamp: msg.timestamp,
        user_id: msg.user_id,
    }
}

pub fn messages(msgs: &[Message]) -> Vec<MessageView> {
    msgs.iter().map(message).collect()
}

pub fn summaries(users: &[User]) -> Vec<UserSummary> {
    users.iter().map(summary).collect()
}
