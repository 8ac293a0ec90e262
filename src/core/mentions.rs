//! # Mention List
//!
//! Decides what the composer's mention picker shows (users, group members,
//! the `@all` row) and produces the entity-span markup a picked mention
//! inserts into the message. That markup is exactly what the sanitizer keeps
//! live when the message is rendered.

use super::formatter::DEFAULT_MENTION_CLASS;

pub const DEFAULT_MENTION_ALL_LABEL: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberListType {
    #[default]
    Users,
    GroupMembers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub guid: String,
    pub name: String,
    pub icon: Option<String>,
}

/// A row of the picker that can be mentioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionCandidate {
    pub uid: String,
    pub name: String,
}

/// What the user picked: a single user, or everyone in the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionSelection {
    User(MentionCandidate),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionSection {
    Users,
    MentionAll,
    GroupMembers,
}

#[derive(Debug, Clone)]
pub struct MentionList {
    pub list_type: MemberListType,
    pub group: Option<Group>,
    pub search_keyword: Option<String>,
    pub disable_mentions: bool,
    pub disable_mention_all: bool,
    pub mention_all_label: String,
}

impl Default for MentionList {
    fn default() -> Self {
        Self {
            list_type: MemberListType::Users,
            group: None,
            search_keyword: None,
            disable_mentions: false,
            disable_mention_all: false,
            mention_all_label: DEFAULT_MENTION_ALL_LABEL.to_string(),
        }
    }
}

impl MentionList {
    pub fn for_group(group: Group) -> Self {
        Self {
            list_type: MemberListType::GroupMembers,
            group: Some(group),
            ..Default::default()
        }
    }

    /// The `@all` row appears for group member lists only, and only while the
    /// search keyword is still a prefix of the label.
    pub fn should_show_mention_all(&self) -> bool {
        if let Some(keyword) = self.search_keyword.as_deref() {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !self.mention_all_label.to_lowercase().starts_with(&keyword) {
                return false;
            }
        }
        !self.disable_mention_all
            && self.list_type == MemberListType::GroupMembers
            && self.group.is_some()
    }

    /// Sections to render, top to bottom.
    pub fn sections(&self) -> Vec<MentionSection> {
        let mut sections = Vec::new();
        match self.list_type {
            MemberListType::Users => {
                if !self.disable_mentions {
                    sections.push(MentionSection::Users);
                }
            }
            MemberListType::GroupMembers => {
                if self.group.is_some() {
                    if self.should_show_mention_all() {
                        sections.push(MentionSection::MentionAll);
                    }
                    if !self.disable_mentions {
                        sections.push(MentionSection::GroupMembers);
                    }
                }
            }
        }
        sections
    }

    /// Whether an empty result list should be reported to the caller. A
    /// visible `@all` row means the picker is not empty.
    pub fn should_report_empty(&self) -> bool {
        !self.should_show_mention_all()
    }

    /// Localization key for the `@all` row label.
    pub fn mention_all_label_key(&self) -> String {
        format!("message_composer_mention_{}", self.mention_all_label)
    }
}

/// Escapes `& " < >` so a value is safe both as attribute and text.
fn escape_markup(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Entity-span markup for a picked mention.
pub fn mention_markup(selection: &MentionSelection, mention_all_label: &str, class: &str) -> String {
    match selection {
        MentionSelection::User(candidate) => format!(
            r#"<span class="{}" data-entity-type="user" data-uid="{}">@{}</span>"#,
            escape_markup(class),
            escape_markup(&candidate.uid),
            escape_markup(&candidate.name)
        ),
        MentionSelection::All => format!(
            r#"<span class="{}" data-entity-type="all" data-entity-id="{}">@{}</span>"#,
            escape_markup(class),
            escape_markup(mention_all_label),
            escape_markup(mention_all_label)
        ),
    }
}

/// [`mention_markup`] with the default mention class.
pub fn default_mention_markup(selection: &MentionSelection) -> String {
    mention_markup(selection, DEFAULT_MENTION_ALL_LABEL, DEFAULT_MENTION_CLASS)
}
