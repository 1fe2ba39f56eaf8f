//! Hash-navigation boundary.

use std::fmt;

/// Views of the kiosk single-page app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The default view; navigation target after a successful check-in.
    CustomerList,
    Scan,
    NewCustomer,
    NewProgram,
}

impl View {
    /// Hash fragment the view is addressed by.
    pub fn as_str(&self) -> &'static str {
        match self {
            View::CustomerList => "customers",
            View::Scan => "scan",
            View::NewCustomer => "new-customer",
            View::NewProgram => "new-program",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Navigation surface of the hosting page.
///
/// The core calls this exactly once per scan-view visit: on successful
/// check-in, with [`View::CustomerList`]. Leaving the scan view implies the
/// camera session is torn down by the page.
pub trait Router: Send + Sync {
    fn navigate_to(&self, view: View);
}
