//! Whitelist/blacklist scoping of dictionary terms.
//!
//! Every dictionary term carries a (possibly empty) set of tags. A
//! [`TagFilter`] decides which terms take part in a scan:
//!
//! - a non-empty whitelist activates only terms sharing at least one tag with it
//!   (untagged terms are excluded),
//! - otherwise a non-empty blacklist deactivates terms sharing any tag with it
//!   (untagged terms stay active),
//! - otherwise every term is active.
//!
//! When both lists are set the whitelist wins and the blacklist is ignored.

use std::collections::HashSet;

/// Which of the two lists drives a [`TagFilter`] decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMode {
    /// Only whitelisted tags are active.
    Whitelist,
    /// Everything except blacklisted tags is active.
    Blacklist,
    /// No filtering.
    All,
}

/// A compiled tag filter.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    whitelist: HashSet<String>,
    blacklist: HashSet<String>,
}

impl TagFilter {
    /// Create a filter from whitelist and blacklist tags.
    pub fn new<W, B>(whitelist: W, blacklist: B) -> Self
    where
        W: IntoIterator,
        W::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            whitelist: whitelist.into_iter().map(Into::into).collect(),
            blacklist: blacklist.into_iter().map(Into::into).collect(),
        }
    }

    /// A filter that lets every term through.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// The list currently driving decisions.
    pub fn mode(&self) -> TagMode {
        if !self.whitelist.is_empty() {
            TagMode::Whitelist
        } else if !self.blacklist.is_empty() {
            TagMode::Blacklist
        } else {
            TagMode::All
        }
    }

    /// Whether a term carrying `tags` is active under this filter.
    pub fn is_active<I, S>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self.mode() {
            TagMode::Whitelist => tags
                .into_iter()
                .any(|tag| self.whitelist.contains(tag.as_ref())),
            TagMode::Blacklist => !tags
                .into_iter()
                .any(|tag| self.blacklist.contains(tag.as_ref())),
            TagMode::All => true,
        }
    }

    /// Keep only the items whose tags pass the filter, preserving order.
    pub fn select<'a, T, F, I>(&self, items: &'a [T], tags_of: F) -> Vec<&'a T>
    where
        F: Fn(&'a T) -> I,
        I: IntoIterator<Item = &'a String>,
    {
        items
            .iter()
            .filter(|item| self.is_active(tags_of(*item)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_no_lists_activates_everything() {
        let filter = TagFilter::allow_all();
        assert_eq!(filter.mode(), TagMode::All);
        assert!(filter.is_active(tags(&[])));
        assert!(filter.is_active(tags(&["anything"])));
    }

    #[test]
    fn test_whitelist_requires_intersection() {
        let filter = TagFilter::new(["a"], Vec::<String>::new());
        assert!(filter.is_active(tags(&["a", "b"])));
        assert!(!filter.is_active(tags(&["b"])));
    }

    #[test]
    fn test_whitelist_excludes_untagged() {
        let filter = TagFilter::new(["a"], Vec::<String>::new());
        assert!(!filter.is_active(tags(&[])));
    }

    #[test]
    fn test_blacklist_excludes_intersection() {
        let filter = TagFilter::new(Vec::<String>::new(), ["noisy"]);
        assert_eq!(filter.mode(), TagMode::Blacklist);
        assert!(!filter.is_active(tags(&["noisy", "other"])));
        assert!(filter.is_active(tags(&["other"])));
    }

    #[test]
    fn test_blacklist_includes_untagged() {
        let filter = TagFilter::new(Vec::<String>::new(), ["noisy"]);
        assert!(filter.is_active(tags(&[])));
    }

    #[test]
    fn test_whitelist_prevails_over_blacklist() {
        let filter = TagFilter::new(["a"], ["a"]);
        assert_eq!(filter.mode(), TagMode::Whitelist);
        assert!(filter.is_active(tags(&["a"])));
        assert!(!filter.is_active(tags(&["b"])));
    }

    #[test]
    fn test_select_preserves_order() {
        let items = vec![tags(&["a"]), tags(&["b"]), tags(&["a", "c"])];
        let filter = TagFilter::new(["a"], Vec::<String>::new());
        let selected = filter.select(&items, |t| t.iter());
        assert_eq!(selected, vec![&items[0], &items[2]]);
    }
}
