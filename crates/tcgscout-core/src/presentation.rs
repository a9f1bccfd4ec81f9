//! Platform-neutral reply payloads.
//!
//! A [`Report`] mirrors a chat embed: title, description, colour, ordered
//! fields, image, footer and timestamp. The builders here are pure; they
//! read a [`CardIdentity`] and a [`PriceResult`] and never look at `prices`
//! on a result that was not found.

use std::fmt::Write as _;

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::{CardIdentity, Game, PriceResult};
use crate::market_info::MarketInfo;

/// Most reports delivered for a single invocation.
pub const MAX_REPORTS: usize = 10;

const PRICE_COLOR: u32 = 0xffd700;
const SEARCH_COLOR: u32 = 0x00bfff;
const MAX_DETAIL_FIELDS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<ReportField>,
    pub image: Option<String>,
    pub footer: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Report {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            color,
            fields: Vec::new(),
            image: None,
            footer: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn field(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push(ReportField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    /// Renders the report as Markdown for terminals and plain-text chats.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("## {}\n", self.title);
        if let Some(description) = &self.description {
            let _ = writeln!(out, "\n{description}");
        }
        for field in &self.fields {
            let _ = writeln!(out, "\n**{}**\n{}", field.name, field.value);
        }
        if let Some(image) = &self.image {
            let _ = writeln!(out, "\n![card]({image})");
        }
        if let Some(footer) = &self.footer {
            let _ = writeln!(out, "\n_{footer}_");
        }
        out
    }
}

/// Star tier derived from rarity and price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectibleRating {
    pub stars: &'static str,
    pub label: &'static str,
    pub color: u32,
}

fn rarity_score(rarity: Option<&str>) -> f64 {
    match rarity.map(str::to_ascii_uppercase).as_deref() {
        Some("SEC" | "UR" | "CSR") => 5.0,
        Some("SSR") => 4.5,
        Some("SSP" | "SVP") => 4.0,
        Some("SR" | "SA") => 3.5,
        Some("RAR") => 3.0,
        Some("RR") => 2.5,
        Some("R") => 2.0,
        Some("C" | "N") => 1.0,
        _ => 1.5,
    }
}

fn price_score(price: f64) -> f64 {
    if price > 100.0 {
        5.0
    } else if price > 50.0 {
        4.0
    } else if price > 20.0 {
        3.0
    } else if price > 5.0 {
        2.0
    } else if price > 1.0 {
        1.5
    } else {
        1.0
    }
}

/// Averages the rarity and price scores into one of five tiers.
pub fn collectible_rating(card: &CardIdentity, result: &PriceResult) -> CollectibleRating {
    let price = if result.found {
        result.headline_price().unwrap_or(0.0)
    } else {
        0.0
    };
    let score = (rarity_score(card.rarity.as_deref()) + price_score(price)) / 2.0;

    let (stars, label, color) = if score >= 4.5 {
        ("⭐⭐⭐⭐⭐", "Collector's gem", 0xffd700)
    } else if score >= 3.5 {
        ("⭐⭐⭐⭐", "High collectible value", 0xffa500)
    } else if score >= 2.5 {
        ("⭐⭐⭐", "Medium collectible value", 0xffff00)
    } else if score >= 1.5 {
        ("⭐⭐", "Common card", 0xcccccc)
    } else {
        ("⭐", "Basic card", 0x999999)
    };
    CollectibleRating {
        stars,
        label,
        color,
    }
}

fn stars_for_label(label: &str) -> &'static str {
    match label.to_lowercase().as_str() {
        "collector's gem" => "⭐⭐⭐⭐⭐",
        "high collectible value" => "⭐⭐⭐⭐",
        "medium collectible value" => "⭐⭐⭐",
        "basic card" => "⭐",
        _ => "⭐⭐",
    }
}

fn heat_for_label(label: &str) -> &'static str {
    match label.to_lowercase().as_str() {
        "very hot" => "🔥🔥🔥",
        "hot" => "🔥🔥",
        "niche" => "❄️",
        _ => "🔥",
    }
}

fn onepiece_rarity_meaning(rarity: &str) -> Option<&'static str> {
    Some(match rarity.to_ascii_uppercase().as_str() {
        "SEC" => "Secret rare",
        "SSR" => "Super super rare",
        "SR" => "Super rare",
        "RAR" | "R" => "Rare",
        "UC" => "Uncommon",
        "C" => "Common",
        "L" => "Leader",
        "DON" => "DON!! card",
        _ => return None,
    })
}

fn detail_label(key: &str) -> String {
    match key {
        "color" => String::from("🎨 Color"),
        "type" => String::from("🎴 Type"),
        "cost" => String::from("💎 Cost"),
        "power" => String::from("⚔️ Power"),
        "hp" => String::from("❤️ HP"),
        "types" => String::from("🏷️ Types"),
        "condition" => String::from("🏷️ Condition"),
        other => other.to_owned(),
    }
}

fn google_search(term: &str) -> String {
    format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(term.trim())
    )
}

fn usd(amount: f64) -> String {
    format!("${amount:.2} USD")
}

/// Reply for one recognized card and its price lookup.
pub fn price_report(
    card: &CardIdentity,
    result: &PriceResult,
    market_info: Option<&MarketInfo>,
) -> Report {
    let title_name = card
        .name_english
        .as_deref()
        .or(card.name_chinese.as_deref())
        .unwrap_or_else(|| card.display_name());
    let mut report = Report::new(format!("{} {title_name}", card.game.emoji()), PRICE_COLOR);

    let alt_names = [card.name_chinese.as_deref(), card.name_japanese.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" | ");
    if !alt_names.is_empty() {
        report.description = Some(alt_names);
    }

    let mut info = Vec::new();
    if let Some(set_name) = &card.set_name {
        info.push(format!("📦 Set: {set_name}"));
    }
    if let Some(number) = &card.card_number {
        info.push(format!("#️⃣ Number: {number}"));
    }
    if let Some(rarity) = &card.rarity {
        info.push(format!("✨ Rarity: {rarity}"));
    }
    if let Some(release_date) = &card.release_date {
        info.push(format!("📅 Released: {release_date}"));
    }
    if let Some(description) = &card.description {
        info.push(format!("📝 Effect: {description}"));
    }
    let rating = collectible_rating(card, result);
    match &card.collectible_value {
        Some(value) => {
            info.push(format!("💎 Collectible value: {} {value}", stars_for_label(value)));
        }
        None => info.push(format!("💎 Collectible value: {} {}", rating.stars, rating.label)),
    }
    if let Some(popularity) = &card.market_popularity {
        info.push(format!("📈 Popularity: {} {popularity}", heat_for_label(popularity)));
    }
    if let Some(usage) = &card.competitive_usage {
        info.push(format!("🏆 Competitive: {usage}"));
    }
    if let Some(highlights) = &card.highlights {
        info.push(format!("✨ Highlights: {highlights}"));
    }
    info.push(String::from("⚠️ For reference only, may be inaccurate"));
    report.field("📋 Card info", info.join("\n"));

    let related = card
        .related_cards
        .iter()
        .filter_map(|related| {
            let name = related.name.as_deref()?;
            let link = google_search(&format!(
                "{name} {} price",
                card.set_name.as_deref().unwrap_or_default()
            ));
            Some(match &related.reason {
                Some(reason) => format!("• [**{name}**]({link}) - {reason}"),
                None => format!("• [**{name}**]({link})"),
            })
        })
        .collect::<Vec<_>>();
    if !related.is_empty() {
        report.field("🔥 Cards worth a look", related.join("\n"));
    }

    let name_only = card
        .name_english
        .as_deref()
        .or(card.name_chinese.as_deref())
        .unwrap_or_default()
        .trim();
    let full = [
        Some(name_only),
        card.set_name.as_deref(),
        card.card_number.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ");
    report.field(
        "🔗 Price search",
        format!(
            "[🎯 Name only]({}) | [📦 Full details]({})",
            google_search(&format!("{name_only} price")),
            google_search(&format!("{full} price"))
        ),
    );

    if result.found {
        report.color = rating.color;
        push_found_details(&mut report, card, result);
    }

    if result.is_search_link_fallback() {
        let links = result
            .search_links
            .iter()
            .flatten()
            .map(|link| format!("[{}]({})", link.name, link.url))
            .collect::<Vec<_>>()
            .join(" | ");
        report.field(
            "🔗 Search card prices",
            format!("No price source answered, search with these links instead:\n{links}"),
        );
    }

    if result.found {
        let price_text = result
            .headline_price()
            .map(usd)
            .unwrap_or_else(|| String::from("No price data"));
        report.field(
            "💰 Market price",
            format!(
                "**{price_text}**\n📊 Source: {}",
                result.source.as_deref().unwrap_or("unknown")
            ),
        );
        if let Some(url) = &result.url {
            report.field("🔗 Product page", format!("[View listing]({url})"));
        }
        report.image = result.image.clone();
    } else {
        let reason = if result.error.is_some() {
            "Price sources are unavailable right now, try again later."
        } else {
            "No price source knows this card."
        };
        report.field("💰 Market price", reason);
    }

    if let Some(info) = market_info {
        report.field(
            "📰 Market news",
            format!("[{}]({})\n{}", info.title, info.url, info.snippet),
        );
    }

    report.footer = Some(String::from("⚡ Powered by Gemini Vision"));
    report
}

fn push_found_details(report: &mut Report, card: &CardIdentity, result: &PriceResult) {
    let mut fields: Vec<(String, String)> = Vec::new();

    if card.set_name.is_none() {
        if let Some(set) = &result.set {
            fields.push((String::from("📚 Details"), format!("📦 Set: {set}")));
        }
    }

    if !result.details.is_empty() {
        let lines = result
            .details
            .iter()
            .map(|(key, value)| format!("{}: {value}", detail_label(key)))
            .collect::<Vec<_>>();
        fields.push((
            format!("{} {} details", card.game.emoji(), card.game.title()),
            lines.join("\n"),
        ));
    }

    if card.game == Game::Onepiece {
        let mut lines = Vec::new();
        if let Some((rarity, meaning)) = card
            .rarity
            .as_deref()
            .and_then(|rarity| Some((rarity, onepiece_rarity_meaning(rarity)?)))
        {
            lines.push(format!("✨ {rarity} - {meaning}"));
        }
        if let Some(number) = &card.card_number {
            lines.push(format!("#️⃣ Number: {number}"));
        }
        if let Some(set_name) = &card.set_name {
            lines.push(format!("📦 Set: {set_name}"));
        }
        if !lines.is_empty() {
            fields.push((String::from("🏴‍☠️ One Piece details"), lines.join("\n")));
        }
    }

    for (name, value) in fields.into_iter().take(MAX_DETAIL_FIELDS) {
        report.field(name, value);
    }
}

/// Reply for the search-by-number command.
pub fn search_report(result: &PriceResult, query: &str, game: Game) -> Report {
    let mut report = Report::new(format!("🔍 Search result: {query}"), SEARCH_COLOR);

    if result.format_error() || !result.found {
        report.description = Some(result.format_hint.clone().unwrap_or_else(|| {
            String::from("😅 No matching card found, check that the card number is correct.")
        }));
        report.field(
            "🔗 Manual search",
            format!(
                "[Google search]({})",
                google_search(&format!("{query} {game} card"))
            ),
        );
        return report;
    }

    let mut info = Vec::new();
    if let Some(name) = &result.name {
        info.push(format!("📛 Name: {name}"));
    }
    if let Some(set) = &result.set {
        info.push(format!("📦 Set: {set}"));
    }
    if let Some(number) = &result.number {
        info.push(format!("#️⃣ Number: {number}"));
    }
    if let Some(rarity) = &result.rarity {
        info.push(format!("✨ Rarity: {rarity}"));
    }
    for (key, value) in &result.details {
        info.push(format!("{}: {value}", detail_label(key)));
    }
    if let Some(price) = result.headline_price() {
        info.push(format!("💰 Market price: {}", usd(price)));
    }
    if !info.is_empty() {
        report.field("📋 Card info", info.join("\n"));
    }

    report.image = result.image.clone();
    report.footer = Some(format!(
        "⚡ Source: {}",
        result.source.as_deref().unwrap_or("unknown")
    ));
    report
}
