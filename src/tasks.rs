//! The simulated user-action table
//!
//! Each task mirrors one operation of the target e-commerce API. A task
//! carries a fixed name, a default relative weight, the status code that
//! counts as success, the body field a successful response must yield,
//! and a typed precondition over session state. Preconditions replace
//! any-attribute-present checks: a task whose inputs are missing is simply
//! ineligible and is never offered to the scheduler.

use crate::outcome::Extraction;
use crate::session::SessionState;

/// One simulated user action against the target API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// `GET /products` — refreshes the session's cached catalog
    BrowseProducts,
    /// `GET /products/{id}` — views one product from the cached catalog
    ViewProduct,
    /// `POST /cart` — adds a cached product, yields the active cart id
    AddToCart,
    /// `POST /order` — checks out the active cart and clears it
    FinalizeOrder,
}

impl TaskKind {
    /// Every task in the stock table
    pub const ALL: [TaskKind; 4] = [
        TaskKind::BrowseProducts,
        TaskKind::ViewProduct,
        TaskKind::AddToCart,
        TaskKind::FinalizeOrder,
    ];

    /// Stable task name used in results, counters, and config keys
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::BrowseProducts => "browse_products",
            TaskKind::ViewProduct => "view_product",
            TaskKind::AddToCart => "add_to_cart",
            TaskKind::FinalizeOrder => "finalize_order",
        }
    }

    /// Stock relative weight (browse 10, view 5, add 3, finalize 2)
    pub fn default_weight(&self) -> f64 {
        match self {
            TaskKind::BrowseProducts => 10.0,
            TaskKind::ViewProduct => 5.0,
            TaskKind::AddToCart => 3.0,
            TaskKind::FinalizeOrder => 2.0,
        }
    }

    /// Status code that counts as success for this task
    pub fn expected_status(&self) -> u16 {
        200
    }

    /// Required-field extraction for a successful response body
    pub fn extraction(&self) -> Extraction {
        match self {
            TaskKind::BrowseProducts => Extraction::Catalog,
            TaskKind::ViewProduct => Extraction::None,
            TaskKind::AddToCart => Extraction::CartId,
            TaskKind::FinalizeOrder => Extraction::None,
        }
    }

    /// Whether the session currently holds everything this task needs.
    ///
    /// Early in a session only browse is eligible; view and add-to-cart
    /// need a populated catalog, finalize needs an active cart.
    pub fn precondition_met(&self, state: &SessionState) -> bool {
        match self {
            TaskKind::BrowseProducts => true,
            TaskKind::ViewProduct | TaskKind::AddToCart => !state.catalog.is_empty(),
            TaskKind::FinalizeOrder => state.cart_id.is_some(),
        }
    }
}
