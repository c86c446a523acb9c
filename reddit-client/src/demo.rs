//! Fixed discussion threads used when no Reddit credentials are configured.

use chrono::DateTime;
use travelmate_core::{PostKind, RedditPost};

struct DemoComment {
    id: &'static str,
    body: &'static str,
    score: i64,
    created_utc: i64,
}

struct DemoThread {
    id: &'static str,
    subreddit: &'static str,
    title: &'static str,
    body: &'static str,
    score: i64,
    created_utc: i64,
    comments: &'static [DemoComment],
}

struct DemoCity {
    names: &'static [&'static str],
    threads: &'static [DemoThread],
}

const BARCELONA: DemoCity = DemoCity {
    names: &["barcelona"],
    threads: &[
        DemoThread {
            id: "demo_bcn_1",
            subreddit: "travel",
            title: "Best cafes in Barcelona",
            body: "Spent a month in Barcelona working remotely. Satan's Coffee Corner in the Gothic Quarter does excellent pour-overs, Nomad Coffee is a must for specialty coffee, and Cafe El Magnifico roasts their own beans.",
            score: 124,
            created_utc: 1_714_000_000,
            comments: &[
                DemoComment {
                    id: "demo_bcn_1_c1",
                    body: "Definitely check out Brunch & Cake too. Amazing breakfast and coffee.",
                    score: 31,
                    created_utc: 1_714_010_000,
                },
                DemoComment {
                    id: "demo_bcn_1_c2",
                    body: "SlowMov in Gracia is my favorite, great atmosphere and beans from local roasters.",
                    score: 18,
                    created_utc: 1_714_020_000,
                },
                DemoComment {
                    id: "demo_bcn_1_c3",
                    body: "meh, overrated",
                    score: 2,
                    created_utc: 1_714_030_000,
                },
            ],
        },
        DemoThread {
            id: "demo_bcn_2",
            subreddit: "solotravel",
            title: "Hidden gems in Barcelona that tourists miss",
            body: "Three years living here. Go to Bunkers del Carmel for sunset, the Labyrinth Park of Horta for a quiet afternoon, and the Montjuic Cemetery for history and sculpture.",
            score: 321,
            created_utc: 1_706_000_000,
            comments: &[
                DemoComment {
                    id: "demo_bcn_2_c1",
                    body: "The Hospital de Sant Pau is incredible and far less crowded than Sagrada Familia.",
                    score: 57,
                    created_utc: 1_706_050_000,
                },
                DemoComment {
                    id: "demo_bcn_2_c2",
                    body: "El Born Centre Cultural is built on archaeological ruins and has great exhibits.",
                    score: 22,
                    created_utc: 1_706_060_000,
                },
            ],
        },
    ],
};

const TOKYO: DemoCity = DemoCity {
    names: &["tokyo"],
    threads: &[
        DemoThread {
            id: "demo_tyo_1",
            subreddit: "solotravel",
            title: "Tokyo: best bars and izakayas for solo travelers",
            body: "Back from two weeks in Tokyo. To meet people try Golden Gai in Shinjuku, Albatross Bar in Shinjuku where the staff speak English, and Coins Bar in Shibuya for cheap drinks.",
            score: 278,
            created_utc: 1_713_000_000,
            comments: &[
                DemoComment {
                    id: "demo_tyo_1_c1",
                    body: "Add Whales of August in Shibuya, the owner is super friendly.",
                    score: 40,
                    created_utc: 1_713_010_000,
                },
                DemoComment {
                    id: "demo_tyo_1_c2",
                    body: "I always end up at Mikkeller Tokyo. Craft beer and a mixed crowd of locals and visitors.",
                    score: 25,
                    created_utc: 1_713_020_000,
                },
            ],
        },
        DemoThread {
            id: "demo_tyo_2",
            subreddit: "travel",
            title: "Unique experiences in Tokyo",
            body: "Beyond the usual spots: Tsukiji Outer Market for breakfast, a cooking class in Asakusa, and the digital art museum TeamLab Borderless.",
            score: 412,
            created_utc: 1_709_000_000,
            comments: &[
                DemoComment {
                    id: "demo_tyo_2_c1",
                    body: "The Yanaka district is perfect for experiencing old Tokyo. Very few tourists.",
                    score: 63,
                    created_utc: 1_709_010_000,
                },
                DemoComment {
                    id: "demo_tyo_2_c2",
                    body: "Catch a baseball game at Tokyo Dome, the atmosphere is incredible.",
                    score: 19,
                    created_utc: 1_709_020_000,
                },
            ],
        },
        DemoThread {
            id: "demo_tyo_3",
            subreddit: "travel",
            title: "First time in Tokyo, temples worth an early start?",
            body: "You must visit the Senso-ji Temple before 8am, the approach through Nakamise Street is empty and the incense smoke in the morning light is unreal.",
            score: 96,
            created_utc: 1_711_000_000,
            comments: &[DemoComment {
                id: "demo_tyo_3_c1",
                body: "The Meiji Shrine is also amazing! Walk in from Harajuku station.",
                score: 35,
                created_utc: 1_711_005_000,
            }],
        },
    ],
};

const NEW_YORK: DemoCity = DemoCity {
    names: &["new york", "new york city", "nyc"],
    threads: &[
        DemoThread {
            id: "demo_nyc_1",
            subreddit: "travel",
            title: "NYC on a budget",
            body: "Ten days in New York on a tight budget. Get the 7-day unlimited MetroCard, eat at food trucks and markets, and use the pay-what-you-wish museum hours.",
            score: 503,
            created_utc: 1_715_000_000,
            comments: &[
                DemoComment {
                    id: "demo_nyc_1_c1",
                    body: "The Staten Island Ferry is free and gives you great views of the Statue of Liberty.",
                    score: 88,
                    created_utc: 1_715_010_000,
                },
                DemoComment {
                    id: "demo_nyc_1_c2",
                    body: "Check out Prospect Park in Brooklyn instead of Central Park, it's less crowded.",
                    score: 41,
                    created_utc: 1_715_020_000,
                },
                DemoComment {
                    id: "demo_nyc_1_c3",
                    body: "The Highline is a fantastic free walk with views of the city.",
                    score: 37,
                    created_utc: 1_715_030_000,
                },
            ],
        },
        DemoThread {
            id: "demo_nyc_2",
            subreddit: "travel",
            title: "Best pizza in New York City after trying 30+ spots",
            body: "My top picks: L&B Spumoni Gardens in Brooklyn for the square slice, Joe's Pizza in Greenwich Village, Scarr's Pizza on the Lower East Side and Lucali in Carroll Gardens.",
            score: 718,
            created_utc: 1_710_000_000,
            comments: &[
                DemoComment {
                    id: "demo_nyc_2_c1",
                    body: "Prince Street Pizza in Nolita should be on this list. Those pepperoni cups!",
                    score: 120,
                    created_utc: 1_710_010_000,
                },
                DemoComment {
                    id: "demo_nyc_2_c2",
                    body: "John's of Bleecker Street is the most underrated pizza in the city.",
                    score: 64,
                    created_utc: 1_710_020_000,
                },
            ],
        },
    ],
};

static DEMO_CITIES: [DemoCity; 3] = [BARCELONA, TOKYO, NEW_YORK];

/// Deterministic stand-in for the live Reddit search.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoDataset;

impl DemoDataset {
    pub fn new() -> Self {
        Self
    }

    /// Cities that have demo threads.
    pub fn cities(&self) -> Vec<&'static str> {
        DEMO_CITIES.iter().map(|city| city.names[0]).collect()
    }

    /// Posts and comments for `city`, in thread order, with `min_score` applied.
    ///
    /// Unknown cities yield nothing. No recency cutoff is applied.
    pub fn posts_for(&self, city: &str, min_score: i64) -> Vec<RedditPost> {
        let needle = city.trim().to_lowercase();
        let Some(demo_city) = DEMO_CITIES
            .iter()
            .find(|c| c.names.iter().any(|name| *name == needle))
        else {
            return Vec::new();
        };

        let mut posts = Vec::new();
        for thread in demo_city.threads {
            if thread.score < min_score {
                continue;
            }
            posts.push(RedditPost {
                id: thread.id.to_string(),
                text: format!("{}\n{}", thread.title, thread.body),
                score: thread.score,
                created_at: DateTime::from_timestamp(thread.created_utc, 0).unwrap_or_default(),
                subreddit: thread.subreddit.to_string(),
                kind: PostKind::Submission,
                permalink: Some(format!(
                    "https://reddit.com/r/{}/comments/{}/",
                    thread.subreddit, thread.id
                )),
            });
            posts.extend(
                thread
                    .comments
                    .iter()
                    .filter(|c| c.score >= min_score && c.body.chars().count() > 15)
                    .map(|c| RedditPost {
                        id: c.id.to_string(),
                        text: c.body.to_string(),
                        score: c.score,
                        created_at: DateTime::from_timestamp(c.created_utc, 0)
                            .unwrap_or_default(),
                        subreddit: thread.subreddit.to_string(),
                        kind: PostKind::Comment,
                        permalink: None,
                    }),
            );
        }
        posts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_city_case_insensitive() {
        let demo = DemoDataset::new();
        let posts = demo.posts_for("  TOKYO ", 5);
        assert!(!posts.is_empty());
        assert!(posts.iter().any(|p| p.text.contains("Senso-ji Temple")));
        assert!(posts.iter().any(|p| p.kind == PostKind::Comment));
    }

    #[test]
    fn test_unknown_city_is_empty() {
        assert!(DemoDataset::new().posts_for("Reykjavik", 0).is_empty());
    }

    #[test]
    fn test_min_score_applies() {
        let demo = DemoDataset::new();
        let all = demo.posts_for("barcelona", 0);
        let filtered = demo.posts_for("barcelona", 20);
        assert!(filtered.len() < all.len());
        assert!(filtered.iter().all(|p| p.score >= 20));
        // Short low-score comment is never emitted
        assert!(all.iter().all(|p| p.text != "meh, overrated"));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let demo = DemoDataset::new();
        assert_eq!(demo.posts_for("nyc", 5), demo.posts_for("New York", 5));
        assert_eq!(demo.posts_for("tokyo", 5), demo.posts_for("tokyo", 5));
    }

    #[test]
    fn test_cities() {
        assert_eq!(DemoDataset::new().cities(), vec!["barcelona", "tokyo", "new york"]);
    }
}
