//! Detail-to-prompt compilers.
//!
//! Each role variant compiles a detail record into the brief handed to
//! that agent. Compilation is pure string assembly over an immutable
//! record, so the same details always produce the same prompt. The
//! roles form closed enums; a string tag that matches no variant means
//! there is no prompt to build and the caller skips that agent.

use crate::session::{CryptoDetails, TripDetails};

/// The member roles of the travel planning team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TravelRole {
    /// Checks the weather at the destination.
    Weather,
    /// Plans the trip itself.
    Travel,
    /// Finds events at the destination.
    Events,
}

impl TravelRole {
    /// Resolves a string tag to a role. Unknown tags resolve to `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "weather_agent" => Some(TravelRole::Weather),
            "travel_agent" => Some(TravelRole::Travel),
            "events_agent" => Some(TravelRole::Events),
            _ => None,
        }
    }

    /// Compiles the brief for this role from the trip details.
    pub fn compile(&self, details: &TripDetails) -> String {
        match self {
            TravelRole::Weather => format!(
                "What's the weather like in {} and what's the best time to \
                 visit for {}?",
                details.destination, details.description
            ),
            TravelRole::Travel => {
                let mut brief = format!(
                    "I'm planning a trip to {} for {} days.\nTransportation: {}",
                    details.destination, details.days, details.transport_mode
                );
                if let Some(city) = &details.departure_city {
                    brief.push_str(&format!(" from {city}"));
                }
                brief.push_str(&format!(
                    "\n\nActivities I'm interested in: {}\n\n\
                     Please help me plan this trip including:\n\
                     - Best time to travel\n\
                     - Estimated flight costs (if applicable)\n\
                     - Recommended return dates\n\
                     - Any travel tips specific to my interests",
                    details.description
                ));
                brief
            }
            TravelRole::Events => format!(
                "Find events in {} related to: {}. I'll be there for {} days.",
                details.destination, details.description, details.days
            ),
        }
    }
}

/// The member roles of the crypto analysis team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CryptoRole {
    /// Market context and price summary.
    Market,
    /// News and overall sentiment.
    News,
    /// Technical analysis.
    Technical,
    /// Sentiment from X (Twitter) posts.
    Sentiment,
}

impl CryptoRole {
    /// Resolves a string tag to a role. Unknown tags resolve to `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "market_agent" => Some(CryptoRole::Market),
            "news_agent" => Some(CryptoRole::News),
            "technical_agent" => Some(CryptoRole::Technical),
            "sentiment_agent" => Some(CryptoRole::Sentiment),
            _ => None,
        }
    }

    /// Compiles the brief for this role from the analysis details.
    pub fn compile(&self, details: &CryptoDetails) -> String {
        let CryptoDetails {
            assets,
            timeframe,
            goal,
        } = details;
        match self {
            CryptoRole::Market => format!(
                "I'm analyzing {assets} with a {timeframe} view. Goal: \
                 {goal}.\n\n\
                 Please help with:\n\
                 - Price context and recent moves\n\
                 - Key levels or support/resistance if relevant\n\
                 - Summary suited to my goal"
            ),
            CryptoRole::News => format!(
                "Find recent news and sentiment for {assets}. Timeframe: \
                 {timeframe}."
            ),
            CryptoRole::Technical => format!(
                "Technical analysis for {assets} on {timeframe} timeframe. \
                 Goal: {goal}."
            ),
            CryptoRole::Sentiment => format!(
                "Collect sentiment from X (Twitter) for: {assets}.\n\n\
                 Search convention: On X, people refer to coins with the $ \
                 prefix (e.g. $AVAX for AVAX) or sometimes the ticker alone \
                 (AVAX). When searching, use both: $TICKER and TICKER for \
                 each asset ({assets}).\n\
                 Rules:\n\
                 - Only use posts that explicitly mention the crypto \
                 ticker(s) (with $ or without).\n\
                 - Ignore any post that contains more than 2 hashtags; \
                 treat multiple hashtags as spam.\n\
                 - Look across many X posts to summarize overall sentiment \
                 (bullish, bearish, neutral, fearful, greedy).\n\
                 - If you find very few relevant posts or almost no recent \
                 chatter, respond clearly: \"No recent news or \
                 developments\" or \"Little to no recent chatter on X for \
                 {assets}.\"\n\
                 - Do not invent posts. If there is not much data, say so.\n\
                 - In your response, do not mention that you are ignoring \
                 posts with many hashtags or describe your filtering \
                 method; only report the sentiment summary."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokyo_trip() -> TripDetails {
        TripDetails {
            destination: "Tokyo".to_owned(),
            transport_mode: "flying".to_owned(),
            departure_city: Some("NYC".to_owned()),
            days: "5".to_owned(),
            description: "food and museums".to_owned(),
        }
    }

    #[test]
    fn test_weather_brief_carries_destination_and_interests() {
        let brief = TravelRole::Weather.compile(&tokyo_trip());
        assert!(brief.contains("Tokyo"));
        assert!(brief.contains("food and museums"));
    }

    #[test]
    fn test_travel_brief_mentions_departure_city_only_when_flying() {
        let brief = TravelRole::Travel.compile(&tokyo_trip());
        assert!(brief.contains("Transportation: flying from NYC"));

        let mut driving = tokyo_trip();
        driving.transport_mode = "driving".to_owned();
        driving.departure_city = None;
        let brief = TravelRole::Travel.compile(&driving);
        assert!(brief.contains("Transportation: driving\n"));
        assert!(!brief.contains("NYC"));
    }

    #[test]
    fn test_events_brief() {
        let brief = TravelRole::Events.compile(&tokyo_trip());
        assert_eq!(
            brief,
            "Find events in Tokyo related to: food and museums. I'll be \
             there for 5 days."
        );
    }

    #[test]
    fn test_compile_is_deterministic() {
        let details = tokyo_trip();
        for role in [TravelRole::Weather, TravelRole::Travel, TravelRole::Events]
        {
            assert_eq!(role.compile(&details), role.compile(&details));
        }
    }

    #[test]
    fn test_unknown_tag_resolves_to_none() {
        assert_eq!(TravelRole::parse("hotel_agent"), None);
        assert_eq!(CryptoRole::parse(""), None);
        assert_eq!(TravelRole::parse("weather_agent"), Some(TravelRole::Weather));
        assert_eq!(CryptoRole::parse("sentiment_agent"), Some(CryptoRole::Sentiment));
    }

    #[test]
    fn test_crypto_briefs() {
        let details = CryptoDetails {
            assets: "AVAX".to_owned(),
            timeframe: "daily".to_owned(),
            goal: "trade".to_owned(),
        };
        let brief = CryptoRole::Market.compile(&details);
        assert!(brief.starts_with("I'm analyzing AVAX with a daily view."));
        let brief = CryptoRole::News.compile(&details);
        assert_eq!(
            brief,
            "Find recent news and sentiment for AVAX. Timeframe: daily."
        );
        let brief = CryptoRole::Sentiment.compile(&details);
        assert!(brief.contains("$TICKER and TICKER"));
        assert!(brief.contains("Little to no recent chatter on X for AVAX."));
    }
}
