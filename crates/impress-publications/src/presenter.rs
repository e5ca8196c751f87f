//! Presenter: renders stores onto a surface and reacts to clicks.
//!
//! View transitions:
//! ```text
//! List --details--> Detail --details-exit--> List
//!  ^ |                 |
//!  +-+ expand-group    +-- details --> Detail
//! ```
//!
//! Every click is resolved by walking up from its origin to the nearest
//! element carrying a `data-trigger` marker. Unmarked clicks are ignored.

use std::fmt;
use std::rc::Rc;

use crate::config::PublicationsConfig;
use crate::error::{PresenterError, PublicationsError, Result, TemplateError};
use crate::record::Record;
use crate::store::{Bucket, Groups, RecordStore};
use crate::surface::{ElementId, Interaction, Surface};
use crate::template::{
    format_category_name, DetailsView, GroupView, GroupsView, HtmlTemplates, ItemSource, ItemView,
    ItemsView, Renderer, Templates, DETAILS_EXIT_TRIGGER, DETAILS_TRIGGER, EXPAND_GROUP_TRIGGER,
    GROUP_CLASS, GROUP_EXPANDED_CLASS, ITEM_ATTR, LOADING_CLASS, TRIGGER_ATTR,
};

/// Which view the surface currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewState {
    /// The list or grouped list last displayed
    #[default]
    List,
    /// A single record's details
    Detail,
}

impl ViewState {
    /// Check if a state transition is valid
    pub fn can_transition_to(&self, target: &ViewState) -> bool {
        match (self, target) {
            (ViewState::List, ViewState::Detail) => true,
            (ViewState::Detail, ViewState::List) => true,
            // Details can link to other details
            (ViewState::Detail, ViewState::Detail) => true,
            // Expanding a group stays in the list
            (ViewState::List, ViewState::List) => true,
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewState::List => write!(f, "LIST"),
            ViewState::Detail => write!(f, "DETAIL"),
        }
    }
}

/// Interaction intents a marker can carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Flip the expanded flag of the group enclosing `marker`
    ExpandGroup { marker: ElementId },
    /// Show the details of the record with this key
    ShowDetails { key: String },
    /// Restore the list view snapshot
    ExitDetails,
}

impl Command {
    /// Map a marked element to its command, or `None` if the element is unmarked
    fn from_element<S: Surface + ?Sized>(surface: &S, element: ElementId) -> Option<Self> {
        let trigger = surface.attribute(element, TRIGGER_ATTR)?;
        match trigger.as_str() {
            EXPAND_GROUP_TRIGGER => Some(Command::ExpandGroup { marker: element }),
            DETAILS_TRIGGER => Some(Command::ShowDetails {
                key: surface.attribute(element, ITEM_ATTR).unwrap_or_default(),
            }),
            DETAILS_EXIT_TRIGGER => Some(Command::ExitDetails),
            _ => None,
        }
    }
}

/// Toggle the loading marker on a surface.
///
/// `None` flips it, `Some(true)` forces it on, `Some(false)` forces it off.
/// Returns whether the marker is present afterwards.
pub fn toggle_spinner<S: Surface + ?Sized>(surface: &mut S, activate: Option<bool>) -> bool {
    surface.toggle_root_class(LOADING_CLASS, activate)
}

/// The list last shown, kept for details lookups and for restoring on exit
#[derive(Debug, Clone)]
struct Listing {
    store: Rc<RecordStore>,
    markup: Rc<str>,
}

/// Renders publications onto one surface and handles its interactions
pub struct Presenter<S: Surface, T: Templates = HtmlTemplates> {
    surface: S,
    config: PublicationsConfig,
    templates: T,
    /// Set by the first successful display, which also installs the listener
    listing: Option<Listing>,
    state: ViewState,
}

impl<S: Surface> Presenter<S, HtmlTemplates> {
    /// Create a presenter using the default HTML templates
    pub fn new(surface: S, config: PublicationsConfig) -> Self {
        Self::with_templates(surface, config, HtmlTemplates)
    }
}

impl<S: Surface, T: Templates> Presenter<S, T> {
    pub fn with_templates(surface: S, config: PublicationsConfig, templates: T) -> Self {
        Self {
            surface,
            config,
            templates,
            listing: None,
            state: ViewState::List,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn templates(&self) -> &T {
        &self.templates
    }

    pub fn view_state(&self) -> ViewState {
        self.state
    }

    /// Store of the last displayed list
    pub fn last_store(&self) -> Option<&Rc<RecordStore>> {
        self.listing.as_ref().map(|listing| &listing.store)
    }

    /// Markup of the last displayed list, restored when details are exited
    pub fn last_markup(&self) -> Option<&str> {
        self.listing.as_ref().map(|listing| &*listing.markup)
    }

    /// Render a store as a list or as groups and show it.
    ///
    /// Nothing changes if rendering fails.
    pub fn display_publications(&mut self, store: impl Into<Rc<RecordStore>>) -> Result<()> {
        let store = store.into();
        let markup = match store.groups() {
            Some(groups) if store.mode().is_grouped() => {
                tracing::debug!(buckets = groups.len(), "rendering grouped list");
                self.render_groups(groups)?
            }
            _ => {
                tracing::debug!("rendering flat list");
                self.render_items(ItemSource::Store(&store))?
            }
        };

        tracing::info!(
            mode = %store.mode(),
            records = store.raw().len(),
            "displaying publications"
        );

        self.surface.write(&markup);
        let first = self.listing.is_none();
        self.listing = Some(Listing {
            store,
            markup: markup.into(),
        });
        self.transition(ViewState::List);

        if first {
            self.surface.listen();
        }
        Ok(())
    }

    /// Show a single record's details. The list snapshot is kept as it was.
    pub fn display_details(&mut self, record: &Record) -> Result<()> {
        let markup = self.render_details(record)?;
        self.surface.write(&markup);
        self.transition(ViewState::Detail);
        Ok(())
    }

    /// Toggle the loading marker on this presenter's surface
    pub fn toggle_spinner(&mut self, activate: Option<bool>) -> bool {
        toggle_spinner(&mut self.surface, activate)
    }

    /// Resolve the command of an interaction, if any
    pub fn classify(&self, interaction: &Interaction) -> Option<Command> {
        let mut current = Some(interaction.origin);
        while let Some(element) = current {
            if let Some(command) = Command::from_element(&self.surface, element) {
                return Some(command);
            }
            current = self.surface.parent(element);
        }
        None
    }

    /// Classify an interaction and run its command.
    ///
    /// Returns the command that ran, or `None` if the interaction was ignored.
    /// A details request for an unknown key fails with `RecordNotFound` and
    /// leaves the surface untouched.
    pub fn handle_interaction(&mut self, interaction: &Interaction) -> Result<Option<Command>> {
        let Some(listing) = self.listing.clone() else {
            return Ok(None);
        };
        let Some(command) = self.classify(interaction) else {
            return Ok(None);
        };

        match &command {
            Command::ExpandGroup { marker } => {
                if self.toggle_group(*marker).is_none() {
                    tracing::debug!("expand-group marker outside of a group, ignoring");
                    return Ok(None);
                }
            }
            Command::ShowDetails { key } => {
                let record = listing
                    .store
                    .find(key)
                    .ok_or_else(|| PresenterError::RecordNotFound(key.clone()))?;
                self.display_details(record)?;
            }
            Command::ExitDetails => {
                self.surface.write(&listing.markup);
                self.transition(ViewState::List);
            }
        }
        Ok(Some(command))
    }

    /// Handle a stream of interactions.
    ///
    /// Details requests for unknown keys are logged and skipped; any other
    /// failure stops processing. Returns the number of commands that ran.
    pub fn process<I>(&mut self, interactions: I) -> Result<usize>
    where
        I: IntoIterator<Item = Interaction>,
    {
        let mut handled = 0;
        for interaction in interactions {
            match self.handle_interaction(&interaction) {
                Ok(Some(_)) => handled += 1,
                Ok(None) => {}
                Err(PublicationsError::Presenter(
                    PresenterError::RecordNotFound(key),
                )) => {
                    tracing::warn!("Ignoring details request for unknown record {}", key);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(handled)
    }

    fn transition(&mut self, target: ViewState) {
        if self.state != target {
            tracing::debug!(from = %self.state, to = %target, "view transition");
        }
        debug_assert!(self.state.can_transition_to(&target));
        self.state = target;
    }

    /// Flip the nearest group enclosing `marker`. Returns the new expanded flag.
    fn toggle_group(&mut self, marker: ElementId) -> Option<bool> {
        let mut current = self.surface.parent(marker);
        while let Some(element) = current {
            if self.surface.has_class(element, GROUP_CLASS) {
                let expanded = self
                    .surface
                    .toggle_class(element, GROUP_EXPANDED_CLASS, None);
                self.surface.set_attribute(
                    element,
                    "aria-expanded",
                    if expanded { "true" } else { "false" },
                );
                return Some(expanded);
            }
            current = self.surface.parent(element);
        }
        None
    }
}

impl<S: Surface, T: Templates> Renderer for Presenter<S, T> {
    fn config(&self) -> &PublicationsConfig {
        &self.config
    }

    fn render_item(&self, record: &Record) -> std::result::Result<String, TemplateError> {
        self.templates.item(ItemView {
            record,
            data: &record.data,
            renderer: self,
        })
    }

    fn render_items(&self, items: ItemSource<'_>) -> std::result::Result<String, TemplateError> {
        self.templates.items(ItemsView {
            items,
            renderer: self,
        })
    }

    fn render_group(&self, bucket: &Bucket) -> std::result::Result<String, TemplateError> {
        self.templates.group(GroupView {
            title: format_category_name(&bucket.key),
            items: &bucket.items,
            expanded: bucket.expanded,
            renderer: self,
        })
    }

    fn render_groups(&self, groups: &Groups) -> std::result::Result<String, TemplateError> {
        self.templates.groups(GroupsView {
            groups,
            renderer: self,
        })
    }

    fn render_branding(&self) -> std::result::Result<String, TemplateError> {
        self.templates.branding()
    }

    fn render_details(&self, record: &Record) -> std::result::Result<String, TemplateError> {
        self.templates.details(DetailsView {
            record,
            data: &record.data,
            renderer: self,
        })
    }
}
