use travelmate_core::{PlaceSource, RedditPost, VerifiedPlace};

/// Longest discussion snippet passed to the model, in characters.
pub const MAX_SNIPPET_CHARS: usize = 1000;

const SYSTEM_PROMPT: &str = "You are TravelMate AI, an expert travel recommendation assistant. \
Your goal is to give personalized, practical travel recommendations grounded in verified place \
data and real Reddit discussions.

Follow these rules:
1. Focus only on the city and interests the user asked about.
2. Give practical, actionable advice structured with clear headings and bullet points.
3. Name specific places from the verified list, with useful details such as ratings or addresses.
4. If the data does not cover part of the request, say so plainly.
5. Cite Reddit mentions when relevant (e.g. \"According to Reddit users...\").
6. End with a short summary of 3-5 must-do items.

IMPORTANT: Use ONLY the data provided below. Do not invent places or draw on general knowledge.";

/// A system instruction plus the user turn carrying the data sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Single-string `[INST]` form for instruction-tuned local models.
    pub fn to_instruct(&self) -> String {
        format!("<s>[INST] {}\n\n{} [/INST]", self.system, self.user)
    }
}

pub fn build_prompt(
    city: &str,
    interests: &[String],
    places: &[VerifiedPlace],
    discussions: &[RedditPost],
    max_snippets: usize,
) -> Prompt {
    let mut user = String::new();

    user.push_str(&format!("VERIFIED PLACES IN {}:\n", city.to_uppercase()));
    user.push_str(&format_places(places));

    user.push_str("\nREDDIT DISCUSSIONS:\n");
    user.push_str(&format_discussions(discussions, max_snippets));

    user.push_str(&format!(
        "\nI'm planning to visit {} and I'm interested in {}. \
         Based on the data above, what are your recommendations?",
        city,
        interests.join(", ")
    ));

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

fn format_places(places: &[VerifiedPlace]) -> String {
    if places.is_empty() {
        return "No verified places were found.\n".to_string();
    }

    let reddit: Vec<&VerifiedPlace> = places
        .iter()
        .filter(|p| p.source == PlaceSource::Reddit)
        .collect();
    let maps: Vec<&VerifiedPlace> = places
        .iter()
        .filter(|p| p.source == PlaceSource::Maps)
        .collect();

    let mut out = String::new();
    if !reddit.is_empty() {
        out.push_str("Mentioned in Reddit discussions:\n");
        for place in reddit {
            out.push_str(&format_place(place));
        }
    }
    if !maps.is_empty() {
        out.push_str("Additional highly-rated places from Google Maps:\n");
        for place in maps {
            out.push_str(&format_place(place));
        }
    }
    out
}

fn format_place(place: &VerifiedPlace) -> String {
    let mut line = format!("- {}", place.name);
    if let Some(place_type) = &place.place_type {
        line.push_str(&format!(" ({})", place_type.replace('_', " ")));
    }
    line.push_str(&format!(" | rating {:.1}/5", place.rating));
    if !place.address.is_empty() {
        line.push_str(&format!(" | {}", place.address));
    }
    let hours = match place.open_now {
        Some(true) => "open now",
        Some(false) => "closed now",
        None => "hours not available",
    };
    line.push_str(&format!(" | {}", hours));
    if let Some(website) = &place.website {
        line.push_str(&format!(" | {}", website));
    }
    line.push('\n');
    for mention in &place.mentions {
        line.push_str(&format!("  Reddit: \"{}\"\n", mention));
    }
    line
}

fn format_discussions(discussions: &[RedditPost], max_snippets: usize) -> String {
    if discussions.is_empty() || max_snippets == 0 {
        return "No Reddit discussions were found.\n".to_string();
    }

    let mut ranked: Vec<&RedditPost> = discussions.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    ranked
        .into_iter()
        .take(max_snippets)
        .map(|post| {
            format!(
                "[r/{} | score {}] {}\n",
                post.subreddit,
                post.score,
                truncate(post.text.trim(), MAX_SNIPPET_CHARS)
            )
        })
        .collect()
}

/// Cut `text` to `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
