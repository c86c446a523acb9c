//! Server-rendered HTML pages.

use orchestrator::RunOutcome;
use travelmate_core::{AppConfig, CoreError, ErrorExt, PlaceSource, TimeFilter, VerifiedPlace};

const STYLE: &str = "body{font-family:sans-serif;max-width:52rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin:.6rem 0}\
pre{white-space:pre-wrap;background:#f6f6f6;padding:1rem}\
.error{color:#a40000}.muted{color:#666}";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

pub fn index_page(config: &AppConfig) -> String {
    let options: String = [
        TimeFilter::Week,
        TimeFilter::Month,
        TimeFilter::Year,
        TimeFilter::All,
    ]
    .iter()
    .map(|filter| {
        let selected = if *filter == config.time_filter {
            " selected"
        } else {
            ""
        };
        format!("<option value=\"{0}\"{1}>{0}</option>", filter, selected)
    })
    .collect();

    let body = format!(
        "<h1>TravelMate</h1>\n\
         <p class=\"muted\">Recommendations from Reddit discussions, verified on Google Maps.</p>\n\
         <form method=\"post\" action=\"/recommend\">\n\
         <label>City <input name=\"city\" required></label>\n\
         <label>Interests <input name=\"interests\" placeholder=\"food, museums\" required></label>\n\
         <label>Time filter <select name=\"time_filter\">{}</select></label>\n\
         <label>Minimum score <input name=\"min_score\" type=\"number\" value=\"{}\"></label>\n\
         <button type=\"submit\">Get recommendations</button>\n\
         </form>\n\
         <h2>Google Maps key</h2>\n\
         <form method=\"post\" action=\"/settings/maps-key\">\n\
         <label>API key <input name=\"api_key\" type=\"password\" required></label>\n\
         <button type=\"submit\">Save</button>\n\
         </form>",
        options, config.min_score
    );
    layout("TravelMate", &body)
}

fn place_item(place: &VerifiedPlace) -> String {
    let mut item = format!(
        "<li><a href=\"{}\">{}</a> &middot; {:.1}&#9733;",
        escape_html(&place.maps_url),
        escape_html(&place.name),
        place.rating
    );
    if !place.address.is_empty() {
        item.push_str(&format!(" &middot; {}", escape_html(&place.address)));
    }
    if let Some(website) = &place.website {
        item.push_str(&format!(
            " &middot; <a href=\"{0}\">{0}</a>",
            escape_html(website)
        ));
    }
    for mention in &place.mentions {
        item.push_str(&format!(
            "<br><span class=\"muted\">&ldquo;{}&rdquo;</span>",
            escape_html(mention)
        ));
    }
    item.push_str("</li>\n");
    item
}

pub fn results_page(outcome: &RunOutcome) -> String {
    let recommendation = &outcome.recommendation;
    let (reddit, maps): (Vec<&VerifiedPlace>, Vec<&VerifiedPlace>) = recommendation
        .verified_places
        .iter()
        .partition(|p| p.source == PlaceSource::Reddit);

    let mut body = format!(
        "<h1>{} for {}</h1>\n<pre>{}</pre>\n",
        escape_html(&recommendation.city),
        escape_html(&recommendation.interests.join(", ")),
        escape_html(&recommendation.generated_text)
    );

    if !reddit.is_empty() {
        body.push_str("<h2>Mentioned on Reddit</h2>\n<ul>\n");
        body.extend(reddit.into_iter().map(place_item));
        body.push_str("</ul>\n");
    }
    if !maps.is_empty() {
        body.push_str("<h2>Also highly rated</h2>\n<ul>\n");
        body.extend(maps.into_iter().map(place_item));
        body.push_str("</ul>\n");
    }

    let stats = &outcome.stats;
    body.push_str(&format!(
        "<p class=\"muted\">{} posts, {} candidates, {} verified from Reddit, {} added from maps search{}</p>\n",
        stats.posts_fetched,
        stats.candidates_extracted,
        stats.verified_from_reddit,
        stats.added_by_top_up,
        if stats.demo_mode { " (demo data)" } else { "" }
    ));
    body.push_str("<p><a href=\"/\">New search</a></p>");
    layout(&format!("TravelMate: {}", recommendation.city), &body)
}

pub fn error_page(error: &CoreError) -> String {
    let body = format!(
        "<h1>Something went wrong</h1>\n<p class=\"error\">{}</p>\n\
         <p class=\"muted\">Error code: {}</p>\n<p><a href=\"/\">Back</a></p>",
        escape_html(&error.user_friendly_message()),
        escape_html(&error.error_code())
    );
    layout("TravelMate: error", &body)
}

pub fn message_page(message: &str) -> String {
    let body = format!(
        "<p>{}</p>\n<p><a href=\"/\">Back</a></p>",
        escape_html(message)
    );
    layout("TravelMate", &body)
}
