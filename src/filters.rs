use chrono::NaiveDate;

use crate::models::{OrderView, RoomType, RoomView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(RoomType),
}

impl CategoryFilter {
    pub fn parse(value: &str) -> Option<Self> {
        if value == "All" {
            return Some(CategoryFilter::All);
        }
        RoomType::parse(value).map(CategoryFilter::Only)
    }
}

/// Catalog filter: `All` is the identity, a concrete category keeps only
/// matching rooms. Relative ordering of the input is preserved.
pub fn rooms_in_category(rooms: Vec<RoomView>, filter: CategoryFilter) -> Vec<RoomView> {
    match filter {
        CategoryFilter::All => rooms,
        CategoryFilter::Only(room_type) => rooms
            .into_iter()
            .filter(|room| room.room_type == room_type)
            .collect(),
    }
}

/// Who is searching decides which fields the term may match against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchScope {
    /// Term matches the room name or the order status.
    Customer,
    /// Term matches the room name or the customer's name.
    Admin,
}

#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    pub search: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

/// Order list filter over an in-memory list in arrival order. The result is
/// newest-created first (arrival order reversed); the term matches
/// case-insensitively on substrings; each supplied date must equal the
/// corresponding order date at day granularity. An absent dimension
/// matches everything.
pub fn newest_first_matching(
    orders: Vec<OrderView>,
    filter: &OrderFilter,
    scope: SearchScope,
) -> Vec<OrderView> {
    let term = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();

    orders
        .into_iter()
        .rev()
        .filter(|order| {
            matches_term(order, &term, scope)
                && filter.check_in.map_or(true, |d| order.check_in_date == d)
                && filter.check_out.map_or(true, |d| order.check_out_date == d)
        })
        .collect()
}

fn matches_term(order: &OrderView, term: &str, scope: SearchScope) -> bool {
    if term.is_empty() {
        return true;
    }
    let room_name = order
        .room
        .as_ref()
        .map(|room| room.name.to_lowercase())
        .unwrap_or_default();
    if room_name.contains(term) {
        return true;
    }
    match scope {
        SearchScope::Customer => order.status.as_str().to_lowercase().contains(term),
        SearchScope::Admin => order.user.name.to_lowercase().contains(term),
    }
}
