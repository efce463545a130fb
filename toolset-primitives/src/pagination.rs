//! Uniform pagination contract.
//!
//! Capabilities accept either offset pagination (`page`, `perPage`) or cursor
//! pagination (`perPage`, `after`). Both translate into a [`NormalizedCursor`]
//! for cursor-driven remote queries. Offset to cursor translation drops the
//! page number: the remote query advances strictly by cursor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PageBound;
use crate::params::{optional_int_or, optional_string};
use crate::{Error, Result};

/// Page used when the caller does not supply one.
pub const DEFAULT_PAGE: i64 = 1;
/// Page size used when the caller does not supply one.
pub const DEFAULT_PER_PAGE: i64 = 30;
/// Smallest valid page number.
pub const MIN_PAGE: i64 = 1;
/// Smallest valid page size.
pub const MIN_PER_PAGE: i64 = 1;
/// Largest valid page size.
pub const MAX_PER_PAGE: i64 = 100;

/// Offset pagination request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// One-based page number.
    pub page: i64,
    /// Requested page size.
    pub per_page: i64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PaginationParams {
    /// Reads `page` and `perPage` from call arguments, applying defaults for
    /// absent values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for non-integer values and
    /// [`Error::PaginationBounds`] when `page` is below 1.
    pub fn from_arguments(args: &Value) -> Result<Self> {
        let page = optional_int_or(args, "page", DEFAULT_PAGE)?;
        if page < MIN_PAGE {
            return Err(Error::PaginationBounds {
                field: "page",
                value: page,
                bound: PageBound::Min(MIN_PAGE),
            });
        }
        let per_page = optional_int_or(args, "perPage", DEFAULT_PER_PAGE)?;
        Ok(Self { page, per_page })
    }

    /// Translates into the normalized cursor form. `after` is always absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaginationBounds`] when `perPage` is outside `[1, 100]`.
    pub fn to_cursor(&self) -> Result<NormalizedCursor> {
        Ok(NormalizedCursor {
            first: validate_per_page(self.per_page)?,
            after: None,
        })
    }

    /// Renders the REST query pairs (`page`, `per_page`) for offset-based
    /// remote endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaginationBounds`] when `perPage` is outside `[1, 100]`.
    pub fn to_query(&self) -> Result<Vec<(String, String)>> {
        let per_page = validate_per_page(self.per_page)?;
        Ok(vec![
            ("page".to_owned(), self.page.to_string()),
            ("per_page".to_owned(), per_page.to_string()),
        ])
    }
}

/// Cursor pagination request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPaginationParams {
    /// Requested page size.
    pub per_page: i64,
    /// Opaque continuation token from a previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl Default for CursorPaginationParams {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            after: None,
        }
    }
}

impl CursorPaginationParams {
    /// Reads `perPage` and `after` from call arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for values of the wrong type.
    pub fn from_arguments(args: &Value) -> Result<Self> {
        Ok(Self {
            per_page: optional_int_or(args, "perPage", DEFAULT_PER_PAGE)?,
            after: optional_string(args, "after")?,
        })
    }

    /// Translates into the normalized cursor form. An empty cursor string
    /// becomes absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaginationBounds`] when `perPage` is outside `[1, 100]`.
    pub fn to_cursor(&self) -> Result<NormalizedCursor> {
        Ok(NormalizedCursor {
            first: validate_per_page(self.per_page)?,
            after: self.after.clone().filter(|cursor| !cursor.is_empty()),
        })
    }
}

/// Either pagination style, as chosen by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaginationRequest {
    /// Page-number addressing.
    Offset(PaginationParams),
    /// Continuation-token addressing.
    Cursor(CursorPaginationParams),
}

impl PaginationRequest {
    /// Reads whichever style the arguments use. A non-empty `after` selects
    /// cursor pagination; anything else is treated as offset pagination.
    ///
    /// # Errors
    ///
    /// Propagates argument and bounds errors from the selected style.
    pub fn from_arguments(args: &Value) -> Result<Self> {
        let has_cursor = optional_string(args, "after")?.is_some_and(|after| !after.is_empty());
        if has_cursor {
            CursorPaginationParams::from_arguments(args).map(Self::Cursor)
        } else {
            PaginationParams::from_arguments(args).map(Self::Offset)
        }
    }

    /// Translates into the normalized cursor form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaginationBounds`] when `perPage` is outside `[1, 100]`.
    pub fn to_cursor(&self) -> Result<NormalizedCursor> {
        match self {
            Self::Offset(params) => params.to_cursor(),
            Self::Cursor(params) => params.to_cursor(),
        }
    }
}

/// Cursor form consumed by cursor-driven remote queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCursor {
    first: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    after: Option<String>,
}

impl NormalizedCursor {
    /// Page size, always within `[1, 100]`.
    #[must_use]
    pub const fn first(&self) -> u32 {
        self.first
    }

    /// Continuation token, if any.
    #[must_use]
    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }
}

fn validate_per_page(per_page: i64) -> Result<u32> {
    if per_page > MAX_PER_PAGE {
        return Err(Error::PaginationBounds {
            field: "perPage",
            value: per_page,
            bound: PageBound::Max(MAX_PER_PAGE),
        });
    }
    if per_page < MIN_PER_PAGE {
        return Err(Error::PaginationBounds {
            field: "perPage",
            value: per_page,
            bound: PageBound::Min(MIN_PER_PAGE),
        });
    }
    u32::try_from(per_page).map_err(|_| Error::invalid_parameter("perPage", "is out of range"))
}
