//! Default English inflector.

use convert_case::{Case, Casing};

use crate::traits::Inflector;

const UNCOUNTABLE: &[&str] = &[
    "data", "equipment", "fish", "information", "media", "metadata", "news", "rice", "series",
    "sheep", "species",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

/// Rule-based English inflector.
///
/// Inflection applies to the trailing word of a CamelCase or snake_case name,
/// so `BlogPost` pluralizes to `BlogPosts` and `user_category` to
/// `user_categories`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishInflector;

impl EnglishInflector {
    /// Create a new inflector.
    pub fn new() -> Self {
        Self
    }
}

/// Split `word` into (prefix, trailing word).
fn split_last_word(word: &str) -> (&str, &str) {
    let idx = word
        .char_indices()
        .rev()
        .find(|&(i, c)| i > 0 && (c.is_uppercase() || c == '_'))
        .map(|(i, c)| if c == '_' { i + 1 } else { i })
        .unwrap_or(0);
    word.split_at(idx)
}

fn match_case(template: &str, replacement: &str) -> String {
    if template.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn pluralize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(s, p)| *s == lower || *p == lower) {
        return match_case(word, plural);
    }

    let stem_before = |n: usize| &word[..word.len() - n];
    if lower.ends_with("ss")
        || lower.ends_with('x')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{word}es");
    }
    if lower.ends_with("us") || lower.ends_with("is") {
        return format!("{word}es");
    }
    if lower.ends_with('s') {
        return word.to_string();
    }
    if lower.ends_with('y') && !lower[..lower.len() - 1].ends_with(is_vowel) {
        return format!("{}ies", stem_before(1));
    }
    if lower.ends_with("fe") {
        return format!("{}ves", stem_before(2));
    }
    if lower.ends_with("lf") || lower.ends_with("af") {
        return format!("{}ves", stem_before(1));
    }
    format!("{word}s")
}

fn singularize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(s, p)| *p == lower || *s == lower) {
        return match_case(word, singular);
    }

    let stem_before = |n: usize| &word[..word.len() - n];
    if lower.ends_with("ies") && lower.len() > 3 {
        return format!("{}y", stem_before(3));
    }
    if lower.ends_with("ives") {
        return format!("{}fe", stem_before(3));
    }
    if lower.ends_with("lves") || lower.ends_with("aves") {
        return format!("{}f", stem_before(3));
    }
    if lower.ends_with("sses")
        || lower.ends_with("xes")
        || lower.ends_with("ches")
        || lower.ends_with("shes")
        || lower.ends_with("uses")
    {
        return stem_before(2).to_string();
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }
    if lower.ends_with('s') {
        return stem_before(1).to_string();
    }
    word.to_string()
}

impl Inflector for EnglishInflector {
    fn pluralize(&self, word: &str) -> String {
        let (prefix, last) = split_last_word(word);
        format!("{prefix}{}", pluralize_word(last))
    }

    fn singularize(&self, word: &str) -> String {
        let (prefix, last) = split_last_word(word);
        format!("{prefix}{}", singularize_word(last))
    }

    fn underscore(&self, word: &str) -> String {
        word.to_case(Case::Snake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        let inflector = EnglishInflector::new();
        assert_eq!(inflector.pluralize("Comment"), "Comments");
        assert_eq!(inflector.pluralize("Comments"), "Comments");
        assert_eq!(inflector.pluralize("Category"), "Categories");
        assert_eq!(inflector.pluralize("Day"), "Days");
        assert_eq!(inflector.pluralize("Box"), "Boxes");
        assert_eq!(inflector.pluralize("Status"), "Statuses");
        assert_eq!(inflector.pluralize("Person"), "People");
        assert_eq!(inflector.pluralize("BlogPost"), "BlogPosts");
        assert_eq!(inflector.pluralize("user_category"), "user_categories");
        assert_eq!(inflector.pluralize("Sheep"), "Sheep");
    }

    #[test]
    fn test_singularize() {
        let inflector = EnglishInflector::new();
        assert_eq!(inflector.singularize("Comments"), "Comment");
        assert_eq!(inflector.singularize("Author"), "Author");
        assert_eq!(inflector.singularize("Categories"), "Category");
        assert_eq!(inflector.singularize("Boxes"), "Box");
        assert_eq!(inflector.singularize("Statuses"), "Status");
        assert_eq!(inflector.singularize("People"), "Person");
        assert_eq!(inflector.singularize("Address"), "Address");
        assert_eq!(inflector.singularize("BlogPosts"), "BlogPost");
    }

    #[test]
    fn test_underscore() {
        let inflector = EnglishInflector::new();
        assert_eq!(inflector.underscore("BlogPosts"), "blog_posts");
        assert_eq!(inflector.underscore("Comments"), "comments");
        assert_eq!(inflector.underscore("author"), "author");
    }
}
