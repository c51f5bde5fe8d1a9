//! Mention text formatting for bulk tag insertion.
//!
//! Display names are optionally shortened to a word limit, rendered in the
//! style the target editor expects, and joined into one insertable string.
//! Everything here is a pure function of its inputs.
//!
//! # Example
//!
//! ```
//! use mention_format::{MentionStyle, join_mentions, render_mention, truncate_words};
//!
//! let first = truncate_words("Ada Lovelace Byron", 2);
//! let mentions = [
//!     render_mention(&first, MentionStyle::PlainText),
//!     render_mention("Acme Inc", MentionStyle::PlainText),
//! ];
//!
//! assert_eq!(join_mentions(mentions), "Ada Lovelace, Acme Inc");
//! ```

use std::borrow::Cow;

/// Delimiter placed between consecutive mentions.
pub const MENTION_DELIMITER: &str = ", ";

/// How a single mention is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MentionStyle {
    /// The display name verbatim.
    #[default]
    PlainText,
    /// The display name HTML-escaped and wrapped in `<strong>` for
    /// rich-text editors.
    Strong,
}

/// Shortens `name` to at most `limit` whitespace-separated words.
///
/// A limit of zero disables truncation and hands back the input untouched.
/// Any other limit collapses runs of whitespace to single spaces.
///
/// # Example
///
/// ```
/// use mention_format::truncate_words;
///
/// assert_eq!(truncate_words("Ada Lovelace Byron", 2), "Ada Lovelace");
/// assert_eq!(truncate_words("Ada Lovelace Byron", 0), "Ada Lovelace Byron");
/// ```
#[must_use]
pub fn truncate_words(name: &str, limit: usize) -> Cow<'_, str> {
    if limit == 0 {
        return Cow::Borrowed(name);
    }

    let words: Vec<&str> = name.split_whitespace().take(limit).collect();
    Cow::Owned(words.join(" "))
}

/// Renders one display name as a mention in the requested style.
#[must_use]
pub fn render_mention(name: &str, style: MentionStyle) -> String {
    match style {
        MentionStyle::PlainText => name.to_owned(),
        MentionStyle::Strong => format!("<strong>{}</strong>", escape_html(name)),
    }
}

/// Joins rendered mentions with [`MENTION_DELIMITER`].
///
/// # Example
///
/// ```
/// use mention_format::join_mentions;
///
/// assert_eq!(join_mentions(["a", "b", "c"]), "a, b, c");
/// assert_eq!(join_mentions(Vec::<String>::new()), "");
/// ```
#[must_use]
pub fn join_mentions<I, S>(mentions: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (position, mention) in mentions.into_iter().enumerate() {
        if position > 0 {
            joined.push_str(MENTION_DELIMITER);
        }
        joined.push_str(mention.as_ref());
    }
    joined
}

fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Ada Lovelace Byron", 2, "Ada Lovelace")]
    #[case("Ada Lovelace Byron", 1, "Ada")]
    #[case("Ada Lovelace Byron", 0, "Ada Lovelace Byron")]
    #[case("Ada Lovelace Byron", 5, "Ada Lovelace Byron")]
    #[case("  Grace   Hopper ", 2, "Grace Hopper")]
    #[case("", 3, "")]
    fn truncate_words_respects_limit(
        #[case] name: &str,
        #[case] limit: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(truncate_words(name, limit), expected);
    }

    #[rstest]
    fn zero_limit_borrows_the_input() {
        let name = "  spaced   out ";
        assert!(matches!(truncate_words(name, 0), Cow::Borrowed(borrowed) if borrowed == name));
    }

    #[rstest]
    #[case(MentionStyle::PlainText, "Ada Byron")]
    #[case(MentionStyle::Strong, "<strong>Ada Byron</strong>")]
    fn render_mention_applies_style(#[case] style: MentionStyle, #[case] expected: &str) {
        assert_eq!(render_mention("Ada Byron", style), expected);
    }

    #[rstest]
    fn strong_mentions_escape_markup() {
        assert_eq!(
            render_mention("R&D <Team> \"Q\"", MentionStyle::Strong),
            "<strong>R&amp;D &lt;Team&gt; &quot;Q&quot;</strong>"
        );
    }

    #[rstest]
    fn plain_mentions_are_not_escaped() {
        assert_eq!(render_mention("R&D", MentionStyle::PlainText), "R&D");
    }

    #[rstest]
    fn single_mention_has_no_delimiter() {
        assert_eq!(join_mentions(["Ada Byron"]), "Ada Byron");
    }

    #[rstest]
    fn join_keeps_insertion_order() {
        let joined = join_mentions(vec!["Ada Byron".to_owned(), "Acme Inc".to_owned()]);
        assert_eq!(joined, "Ada Byron, Acme Inc");
    }
}
