//! Markup templates.
//!
//! Templates are pure functions from a view model to markup text. Each view
//! model carries a [`Renderer`] so a template can render nested parts (a group
//! renders its items, a list renders each item) through the presenter.

use lazy_static::lazy_static;
use quick_xml::escape::escape;
use regex::Regex;

use crate::config::PublicationsConfig;
use crate::error::TemplateError;
use crate::record::{Record, RecordData};
use crate::store::{Bucket, Entry, Groups, RecordStore};

/// Marker attribute naming the intent of an element
pub const TRIGGER_ATTR: &str = "data-trigger";
/// Attribute carrying a record key on a details marker
pub const ITEM_ATTR: &str = "data-item";
pub const EXPAND_GROUP_TRIGGER: &str = "expand-group";
pub const DETAILS_TRIGGER: &str = "details";
pub const DETAILS_EXIT_TRIGGER: &str = "details-exit";

pub const GROUP_CLASS: &str = "zotero-group";
pub const GROUP_EXPANDED_CLASS: &str = "zotero-group-expanded";
pub const LOADING_CLASS: &str = "zotero-loading";

/// Rendering capabilities offered to templates
pub trait Renderer {
    fn config(&self) -> &PublicationsConfig;
    fn render_item(&self, record: &Record) -> Result<String, TemplateError>;
    fn render_items(&self, items: ItemSource<'_>) -> Result<String, TemplateError>;
    fn render_group(&self, bucket: &Bucket) -> Result<String, TemplateError>;
    fn render_groups(&self, groups: &Groups) -> Result<String, TemplateError>;
    fn render_branding(&self) -> Result<String, TemplateError>;
    fn render_details(&self, record: &Record) -> Result<String, TemplateError>;
}

/// Records handed to the list template
#[derive(Debug, Clone, Copy)]
pub enum ItemSource<'a> {
    /// A whole store, iterated through its current view
    Store(&'a RecordStore),
    /// A plain slice, e.g. the items of one bucket
    Records(&'a [Record]),
}

impl<'a> ItemSource<'a> {
    /// Records in display order. A grouped store yields the items of each
    /// bucket in bucket order.
    pub fn records(&self) -> Box<dyn Iterator<Item = &'a Record> + 'a> {
        match *self {
            ItemSource::Records(records) => Box::new(records.iter()),
            ItemSource::Store(store) => Box::new(store.iter().flat_map(|entry| match entry {
                Entry::Record(record) => std::slice::from_ref(record).iter(),
                Entry::Group(_, bucket) => bucket.items.iter(),
            })),
        }
    }

    /// Whether this is the outermost list of a view
    pub fn is_top_level(&self) -> bool {
        matches!(self, ItemSource::Store(_))
    }
}

impl<'a> From<&'a RecordStore> for ItemSource<'a> {
    fn from(store: &'a RecordStore) -> Self {
        ItemSource::Store(store)
    }
}

impl<'a> From<&'a [Record]> for ItemSource<'a> {
    fn from(records: &'a [Record]) -> Self {
        ItemSource::Records(records)
    }
}

/// One record in a list
pub struct ItemView<'a> {
    pub record: &'a Record,
    /// The record's payload, for templates that only read fields
    pub data: &'a RecordData,
    pub renderer: &'a dyn Renderer,
}

/// A list of records, either a whole store or one bucket
pub struct ItemsView<'a> {
    pub items: ItemSource<'a>,
    pub renderer: &'a dyn Renderer,
}

/// One bucket of a grouped store
pub struct GroupView<'a> {
    /// Display title derived from the bucket key
    pub title: String,
    /// Bucket items, already in display order
    pub items: &'a [Record],
    /// Whether the group starts out expanded
    pub expanded: bool,
    pub renderer: &'a dyn Renderer,
}

/// All buckets of a grouped store, in bucket order
pub struct GroupsView<'a> {
    pub groups: &'a Groups,
    pub renderer: &'a dyn Renderer,
}

/// The detail view of a single record
pub struct DetailsView<'a> {
    pub record: &'a Record,
    pub data: &'a RecordData,
    pub renderer: &'a dyn Renderer,
}

/// One markup function per view kind
pub trait Templates {
    fn item(&self, view: ItemView<'_>) -> Result<String, TemplateError>;
    fn items(&self, view: ItemsView<'_>) -> Result<String, TemplateError>;
    fn group(&self, view: GroupView<'_>) -> Result<String, TemplateError>;
    fn groups(&self, view: GroupsView<'_>) -> Result<String, TemplateError>;
    fn branding(&self) -> Result<String, TemplateError>;
    fn details(&self, view: DetailsView<'_>) -> Result<String, TemplateError>;
}

lazy_static! {
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();
}

/// Turn a type classifier into a title, e.g. `journalArticle` -> `Journal Article`
pub fn format_category_name(name: &str) -> String {
    let spaced = CAMEL_BOUNDARY.replace_all(name, "$1 $2");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Escape text for use in markup content and attribute values
pub fn escape_html(text: &str) -> String {
    escape(text).into_owned()
}

/// HTML templates for Zotero-style publication lists
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTemplates;

impl HtmlTemplates {
    fn detail_value(record: &Record, field: &str) -> Option<String> {
        match field {
            "title" => Some(record.title()),
            "creators" => record.creators_summary(),
            _ => record.field(field),
        }
    }
}

impl Templates for HtmlTemplates {
    fn item(&self, view: ItemView<'_>) -> Result<String, TemplateError> {
        let item_type = view.data.item_type.as_deref().unwrap_or_default();
        let title = escape_html(&view.record.title());

        let mut markup = format!(
            "<li class=\"zotero-item zotero-{}\" role=\"listitem\">",
            escape_html(item_type)
        );
        if view.renderer.config().show_details {
            markup.push_str(&format!(
                "<a href=\"#\" class=\"zotero-item-title\" {}=\"{}\" {}=\"{}\">{}</a>",
                TRIGGER_ATTR,
                DETAILS_TRIGGER,
                ITEM_ATTR,
                escape_html(&view.record.key),
                title
            ));
        } else {
            markup.push_str(&format!("<span class=\"zotero-item-title\">{}</span>", title));
        }

        let meta: Vec<String> = [view.record.creators_summary(), view.record.field("date")]
            .into_iter()
            .flatten()
            .map(|m| escape_html(&m))
            .collect();
        if !meta.is_empty() {
            markup.push_str(&format!(
                "<div class=\"zotero-item-meta\">{}</div>",
                meta.join(" &#183; ")
            ));
        }
        markup.push_str("</li>");
        Ok(markup)
    }

    fn items(&self, view: ItemsView<'_>) -> Result<String, TemplateError> {
        let mut markup = String::from("<ul class=\"zotero-items\" role=\"list\">");
        for record in view.items.records() {
            markup.push_str(&view.renderer.render_item(record)?);
        }
        markup.push_str("</ul>");

        if view.items.is_top_level() && view.renderer.config().show_branding {
            markup.push_str(&view.renderer.render_branding()?);
        }
        Ok(markup)
    }

    fn group(&self, view: GroupView<'_>) -> Result<String, TemplateError> {
        Ok(format!(
            "<li class=\"{}{}\" aria-expanded=\"{}\" role=\"listitem\">\
             <h2 class=\"zotero-group-title\" {}=\"{}\">{}</h2>{}</li>",
            GROUP_CLASS,
            if view.expanded {
                format!(" {}", GROUP_EXPANDED_CLASS)
            } else {
                String::new()
            },
            view.expanded,
            TRIGGER_ATTR,
            EXPAND_GROUP_TRIGGER,
            escape_html(&view.title),
            view.renderer.render_items(ItemSource::Records(view.items))?
        ))
    }

    fn groups(&self, view: GroupsView<'_>) -> Result<String, TemplateError> {
        let mut markup = String::from("<ul class=\"zotero-groups\" role=\"list\">");
        for bucket in view.groups.values() {
            markup.push_str(&view.renderer.render_group(bucket)?);
        }
        markup.push_str("</ul>");

        if view.renderer.config().show_branding {
            markup.push_str(&view.renderer.render_branding()?);
        }
        Ok(markup)
    }

    fn branding(&self) -> Result<String, TemplateError> {
        Ok("<div class=\"zotero-branding\">Powered by \
            <a href=\"https://www.zotero.org/\" rel=\"nofollow\">Zotero</a></div>"
            .to_string())
    }

    fn details(&self, view: DetailsView<'_>) -> Result<String, TemplateError> {
        let mut markup = format!(
            "<div class=\"zotero-details\">\
             <a href=\"#\" class=\"zotero-details-exit\" {}=\"{}\">Back to publications</a>\
             <h2 class=\"zotero-details-title\">{}</h2><dl class=\"zotero-details-fields\">",
            TRIGGER_ATTR,
            DETAILS_EXIT_TRIGGER,
            escape_html(&view.record.title())
        );

        if let Some(item_type) = view.data.item_type.as_deref() {
            markup.push_str(&format!(
                "<dt>Item Type</dt><dd>{}</dd>",
                escape_html(&format_category_name(item_type))
            ));
        }
        for field in &view.renderer.config().detail_fields {
            if field == "title" {
                continue;
            }
            if let Some(value) = Self::detail_value(view.record, field) {
                markup.push_str(&format!(
                    "<dt>{}</dt><dd>{}</dd>",
                    escape_html(&format_category_name(field)),
                    escape_html(&value)
                ));
            }
        }
        markup.push_str("</dl></div>");
        Ok(markup)
    }
}
