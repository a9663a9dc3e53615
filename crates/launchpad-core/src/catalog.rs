//! Static channel catalog: display metadata and best practices per channel.

use serde::Serialize;

use crate::types::{Channel, ContentFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub channel: Channel,
    pub label: &'static str,
    /// Brand color as a `#rrggbb` hex string.
    pub color: &'static str,
    pub supported_formats: &'static [ContentFormat],
    pub description: &'static str,
    /// Ordered; the first entry is the channel's primary call-to-action.
    pub best_practices: &'static [&'static str],
}

pub const CATALOG: [ChannelInfo; 6] = [
    ChannelInfo {
        channel: Channel::Instagram,
        label: "Instagram",
        color: "#E1306C",
        supported_formats: &[
            ContentFormat::Reels,
            ContentFormat::Carousel,
            ContentFormat::Story,
        ],
        description: "Primary launch surface: reels drive discovery, carousels drive saves.",
        best_practices: &[
            "Ask a polarizing question to spark comments in the first hour.",
            "Pin a save-worthy summary comment under the reel.",
            "Keep on-screen text inside the center safe zone.",
        ],
    },
    ChannelInfo {
        channel: Channel::Youtube,
        label: "YouTube Shorts",
        color: "#FF0000",
        supported_formats: &[ContentFormat::Shorts],
        description: "Search-indexed short video with long-tail discovery.",
        best_practices: &[
            "Close with a subscribe prompt tied to the next episode.",
            "Link the Short to a related long-form video.",
            "Front-load the keyword in the title.",
        ],
    },
    ChannelInfo {
        channel: Channel::Facebook,
        label: "Facebook Reels",
        color: "#1877F2",
        supported_formats: &[ContentFormat::Reels, ContentFormat::Story],
        description: "Community-driven reach through shares into groups.",
        best_practices: &[
            "Invite viewers to share with a friend who needs it.",
            "Seed the first comment with a discussion prompt.",
        ],
    },
    ChannelInfo {
        channel: Channel::Threads,
        label: "Threads",
        color: "#101010",
        supported_formats: &[ContentFormat::Carousel],
        description: "Conversational text-first companion to Instagram.",
        best_practices: &[
            "Open with a one-line hook and reply-chain the breakdown.",
            "End the thread with a link back to the reel.",
        ],
    },
    ChannelInfo {
        channel: Channel::Pinterest,
        label: "Pinterest",
        color: "#E60023",
        supported_formats: &[ContentFormat::IdeaPin, ContentFormat::Carousel],
        description: "Evergreen visual search with months-long traffic tails.",
        best_practices: &[
            "Frame the payoff as a saveable checklist.",
            "Use keyword-rich pin titles and boards.",
        ],
    },
    ChannelInfo {
        channel: Channel::Tiktok,
        label: "TikTok",
        color: "#25F4EE",
        supported_formats: &[ContentFormat::Shorts, ContentFormat::Reels],
        description: "Trend-driven algorithmic feed rewarding fast hooks.",
        best_practices: &[
            "Prompt viewers to stitch with their own result.",
            "Ride a trending sound at low volume under the voiceover.",
        ],
    },
];

/// Catalog entry for `channel`. Every channel has exactly one entry.
#[must_use]
pub fn channel_info(channel: Channel) -> &'static ChannelInfo {
    match channel {
        Channel::Instagram => &CATALOG[0],
        Channel::Youtube => &CATALOG[1],
        Channel::Facebook => &CATALOG[2],
        Channel::Threads => &CATALOG[3],
        Channel::Pinterest => &CATALOG[4],
        Channel::Tiktok => &CATALOG[5],
    }
}
