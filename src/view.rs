// View model
//
// One page, at most one overlay, one session. Every transition either
// succeeds or returns a ViewError and leaves the state untouched.

use crate::catalog::Catalog;
use crate::discovery::Recommendation;
use crate::error::ViewError;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Page {
    Home,
    Colleges,
    Reviews,
    Updates,
    Login,
    SignUp,
    CollegeDetail(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Overlay {
    None,
    AdminDashboard,
    Comparison,
    Profile,
    Discovery,
    ReviewForm(String),
}

impl Overlay {
    pub fn name(&self) -> &'static str {
        match self {
            Overlay::None => "nothing",
            Overlay::AdminDashboard => "admin dashboard",
            Overlay::Comparison => "comparison",
            Overlay::Profile => "profile",
            Overlay::Discovery => "discovery",
            Overlay::ReviewForm(_) => "review form",
        }
    }

    pub fn members_only(&self) -> bool {
        matches!(
            self,
            Overlay::AdminDashboard | Overlay::Comparison | Overlay::Profile
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Session {
    Anonymous,
    SignedIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    page: Page,
    overlay: Overlay,
    session: Session,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            page: Page::Home,
            overlay: Overlay::None,
            session: Session::Anonymous,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn is_signed_in(&self) -> bool {
        self.session == Session::SignedIn
    }

    /// Id of the college whose detail page is showing
    pub fn selected_college(&self) -> Option<&str> {
        match &self.page {
            Page::CollegeDetail(id) => Some(id),
            _ => None,
        }
    }

    /// Switch page; any open overlay is closed.
    /// Detail pages are only reachable through `open_college` and
    /// `select_recommendation`, which check the id against the catalog.
    pub fn navigate(&mut self, page: Page) -> Result<(), ViewError> {
        if let Page::CollegeDetail(id) = page {
            return Err(ViewError::DetailNeedsCatalog(id));
        }
        self.show(page);
        Ok(())
    }

    pub fn open_college(&mut self, id: &str, catalog: &Catalog) -> Result<(), ViewError> {
        if catalog.find_by_id(id).is_none() {
            return Err(ViewError::UnknownCollege(id.to_string()));
        }
        self.show(Page::CollegeDetail(id.to_string()));
        Ok(())
    }

    fn show(&mut self, page: Page) {
        debug!(?page, "Navigate");
        self.page = page;
        self.overlay = Overlay::None;
    }

    pub fn open_overlay(&mut self, overlay: Overlay) -> Result<(), ViewError> {
        if overlay == Overlay::None {
            self.close_overlay();
            return Ok(());
        }
        if self.overlay != Overlay::None && self.overlay != overlay {
            return Err(ViewError::OverlayOpen(self.overlay.name()));
        }
        if overlay.members_only() && !self.is_signed_in() {
            return Err(ViewError::SignInRequired(overlay.name()));
        }
        if let Overlay::ReviewForm(id) = &overlay {
            if self.selected_college() != Some(id.as_str()) {
                return Err(ViewError::NoCollegeSelected);
            }
        }

        debug!(overlay = overlay.name(), "Open overlay");
        self.overlay = overlay;
        Ok(())
    }

    /// Review form for the college on screen
    pub fn open_review_form(&mut self) -> Result<(), ViewError> {
        let id = self
            .selected_college()
            .ok_or(ViewError::NoCollegeSelected)?
            .to_string();
        self.open_overlay(Overlay::ReviewForm(id))
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
    }

    pub fn sign_in(&mut self) {
        self.session = Session::SignedIn;
        if matches!(self.page, Page::Login | Page::SignUp) {
            self.page = Page::Home;
        }
    }

    pub fn sign_out(&mut self) {
        self.session = Session::Anonymous;
        if self.overlay.members_only() {
            self.overlay = Overlay::None;
        }
    }

    /// Leave discovery for the recommended college's detail page
    pub fn select_recommendation(
        &mut self,
        recommendation: &Recommendation,
        catalog: &Catalog,
    ) -> Result<(), ViewError> {
        let college = recommendation
            .resolve(catalog)
            .ok_or_else(|| ViewError::UnknownCollege(recommendation.college_id.clone()))?;
        self.show(Page::CollegeDetail(college.id.clone()));
        Ok(())
    }
}
