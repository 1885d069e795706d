use std::borrow::Cow;
use std::collections::HashSet;

use crate::model::Article;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x200?text=No+Image";
pub const SUMMARY_CHARS: usize = 100;

/// Shorten a description for the card summary, counting characters, not bytes.
pub fn summarize(description: &str) -> Cow<'_, str> {
    match description.char_indices().nth(SUMMARY_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &description[..cut])),
        None => Cow::Borrowed(description),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView<'a> {
    pub article: &'a Article,
    pub summary: Cow<'a, str>,
    pub image: &'a str,
}

impl<'a> CardView<'a> {
    /// `broken` holds image references that failed to load.
    pub fn new(article: &'a Article, broken: &HashSet<String>) -> Self {
        let image = match article.primary_image() {
            Some(url) if !url.is_empty() && !broken.contains(url) => url,
            _ => PLACEHOLDER_IMAGE,
        };
        Self {
            article,
            summary: summarize(&article.description),
            image,
        }
    }

    pub fn extra_images(&self) -> usize {
        self.article.images.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListView<'a> {
    Loading,
    Empty,
    Populated(Vec<CardView<'a>>),
}

impl<'a> ListView<'a> {
    pub fn new(articles: &'a [Article], loading: bool, broken: &HashSet<String>) -> Self {
        if loading {
            ListView::Loading
        } else if articles.is_empty() {
            ListView::Empty
        } else {
            ListView::Populated(articles.iter().map(|a| CardView::new(a, broken)).collect())
        }
    }

    pub fn heading(&self) -> String {
        match self {
            ListView::Populated(cards) => format!("All News ({})", cards.len()),
            _ => "All News".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{sample_articles, ArticleId};
    use chrono::Utc;

    fn with_description(description: &str) -> Article {
        Article {
            id: ArticleId::new("1"),
            title: "T".into(),
            description: description.into(),
            images: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn long_descriptions_are_cut_at_100_chars() {
        let long = "x".repeat(150);
        let summary = summarize(&long);
        assert_eq!(summary, format!("{}...", "x".repeat(100)));

        let short = "y".repeat(80);
        assert_eq!(summarize(&short), short.as_str());
        assert!(matches!(summarize(&"z".repeat(100)), Cow::Borrowed(_)));
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        let text = "é".repeat(120);
        let summary = summarize(&text);
        assert_eq!(summary.chars().count(), 103);
        assert!(summary.ends_with("é..."));
    }

    #[test]
    fn missing_or_broken_images_use_placeholder() {
        let none = with_description("d");
        assert_eq!(CardView::new(&none, &HashSet::new()).image, PLACEHOLDER_IMAGE);

        let mut blank = with_description("d");
        blank.images = vec![String::new()];
        assert_eq!(CardView::new(&blank, &HashSet::new()).image, PLACEHOLDER_IMAGE);

        let article = sample_articles().remove(0);
        let primary = article.images[0].clone();
        assert_eq!(CardView::new(&article, &HashSet::new()).image, primary);

        let broken: HashSet<String> = [primary].into_iter().collect();
        let card = CardView::new(&article, &broken);
        assert_eq!(card.image, PLACEHOLDER_IMAGE);
        assert_eq!(card.extra_images(), 1);
    }

    #[test]
    fn list_has_three_exclusive_states() {
        let broken = HashSet::new();
        let articles = sample_articles();

        assert_eq!(ListView::new(&articles, true, &broken), ListView::Loading);
        assert_eq!(ListView::new(&[], false, &broken), ListView::Empty);

        let view = ListView::new(&articles, false, &broken);
        assert_eq!(view.heading(), "All News (2)");
        match view {
            ListView::Populated(cards) => {
                let titles: Vec<_> = cards.iter().map(|c| c.article.title.as_str()).collect();
                assert_eq!(titles, vec![articles[0].title.as_str(), articles[1].title.as_str()]);
            }
            other => panic!("expected cards, got {other:?}"),
        }
    }
}
