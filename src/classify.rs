//! Priority-ordered article-type rules.

use crate::models::ArticleType;

/// Rules in priority order; the first rule with any matching phrase wins.
const RULES: &[(ArticleType, &[&str])] = &[
    (ArticleType::Recommendation, &["stocks to buy", "top picks"]),
    (ArticleType::Opinion, &["rating", "target price", "upside", "coverage"]),
    (ArticleType::Quote, &["says", "said", "according to", "as per"]),
];

/// Classify a page from its title and optional body.
pub fn classify_article(title: &str, body: Option<&str>) -> ArticleType {
    let text = format!("{} {}", title, body.unwrap_or("")).to_lowercase();
    RULES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| text.contains(*p)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ArticleType::Mention)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opinion_beats_quote() {
        let title = "Analyst says ICICI Securities coverage initiated with target price ₹900";
        assert_eq!(classify_article(title, None), ArticleType::Opinion);
    }

    #[test]
    fn test_recommendation_has_top_priority() {
        assert_eq!(
            classify_article("Top Picks for Diwali", Some("Rating upgraded, analyst says")),
            ArticleType::Recommendation
        );
        assert_eq!(
            classify_article("5 stocks to buy", None),
            ArticleType::Recommendation
        );
    }

    #[test]
    fn test_quote_and_mention() {
        assert_eq!(
            classify_article("Broker view", Some("According to ICICI Securities, demand is firm")),
            ArticleType::Quote
        );
        assert_eq!(
            classify_article("ICICI Securities shares close flat", None),
            ArticleType::Mention
        );
    }

    #[test]
    fn test_deterministic() {
        let title = "ICICI Securities said upside remains";
        let first = classify_article(title, None);
        for _ in 0..10 {
            assert_eq!(classify_article(title, None), first);
        }
        assert_eq!(first, ArticleType::Opinion);
    }
}
