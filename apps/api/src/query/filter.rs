//! Filter and ordering specifications
//!
//! These are inert descriptions of a list query. They carry no behavior of
//! their own; a [`CatalogStore`](crate::store::CatalogStore) implementation is
//! responsible for translating them into its own query language.

use crate::models::ProductStatus;

/// Which part of the category tree a listing is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentFilter {
    /// Root-level entries only (no parent)
    Root,
    /// Direct children of the given category
    Id(i64),
}

impl std::str::FromStr for ParentFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "root" | "null" | "none" => Ok(Self::Root),
            other => other
                .parse::<i64>()
                .map(Self::Id)
                .map_err(|_| format!("expected a category id or 'root', got '{}'", other)),
        }
    }
}

/// A single restriction on a list query
///
/// The set is closed: every filter the storefront supports is one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Primary key is one of the given ids
    IdIn(Vec<i64>),
    /// Slug is one of the given values
    SlugIn(Vec<String>),
    /// Product status equals the value
    Status(ProductStatus),
    /// Product featured flag equals the value
    Featured(bool),
    /// Product is linked to the category with this slug
    CategorySlug(String),
    /// Product is linked to the collection with this slug
    CollectionSlug(String),
    /// Name contains the value, case-insensitive
    NameContains(String),
    /// Category/collection visibility flag equals the value
    Visible(bool),
    /// Category parent reference matches
    Parent(ParentFilter),
    /// Row belongs to one of the given products
    ProductIdIn(Vec<i64>),
    /// Row belongs to one of the given variants
    VariantIdIn(Vec<i64>),
    /// Row belongs to one of the given users
    UserIdIn(Vec<i64>),
    /// Row belongs to one of the given carts
    CartIdIn(Vec<i64>),
    /// Review moderation flag equals the value
    Published(bool),
    /// Theme active flag equals the value
    Active(bool),
}

impl Predicate {
    /// Short stable name, used in error messages and logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::IdIn(_) => "id_in",
            Self::SlugIn(_) => "slug_in",
            Self::Status(_) => "status",
            Self::Featured(_) => "featured",
            Self::CategorySlug(_) => "category_slug",
            Self::CollectionSlug(_) => "collection_slug",
            Self::NameContains(_) => "name_contains",
            Self::Visible(_) => "visible",
            Self::Parent(_) => "parent",
            Self::ProductIdIn(_) => "product_id_in",
            Self::VariantIdIn(_) => "variant_id_in",
            Self::UserIdIn(_) => "user_id_in",
            Self::CartIdIn(_) => "cart_id_in",
            Self::Published(_) => "published",
            Self::Active(_) => "active",
        }
    }
}

/// Conjunction of predicates; an empty filter matches every row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    predicates: Vec<Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`FilterSpec::push`]
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl FromIterator<Predicate> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

/// Sortable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Id,
    CreatedAt,
    Price,
    Name,
    Position,
    IsDefault,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CreatedAt => "created_at",
            Self::Price => "price",
            Self::Name => "name",
            Self::Position => "position",
            Self::IsDefault => "is_default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderTerm {
    pub field: SortField,
    pub direction: Direction,
}

/// Ordered list of sort terms; earlier terms take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSpec {
    terms: Vec<OrderTerm>,
}

impl OrderSpec {
    /// No ordering; the store decides
    pub fn unordered() -> Self {
        Self::default()
    }

    pub fn by(field: SortField, direction: Direction) -> Self {
        Self::unordered().then(field, direction)
    }

    pub fn then(mut self, field: SortField, direction: Direction) -> Self {
        self.terms.push(OrderTerm { field, direction });
        self
    }

    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Public sort keys accepted by list endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortKey {
    /// Parse a sort key, `None` for anything unrecognised
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "newest" => Some(Self::Newest),
            "oldest" => Some(Self::Oldest),
            "price-asc" => Some(Self::PriceAsc),
            "price-desc" => Some(Self::PriceDesc),
            "name-asc" => Some(Self::NameAsc),
            "name-desc" => Some(Self::NameDesc),
            _ => None,
        }
    }

    pub fn order(&self) -> OrderSpec {
        match self {
            Self::Newest => OrderSpec::by(SortField::CreatedAt, Direction::Desc),
            Self::Oldest => OrderSpec::by(SortField::CreatedAt, Direction::Asc),
            Self::PriceAsc => OrderSpec::by(SortField::Price, Direction::Asc),
            Self::PriceDesc => OrderSpec::by(SortField::Price, Direction::Desc),
            Self::NameAsc => OrderSpec::by(SortField::Name, Direction::Asc),
            Self::NameDesc => OrderSpec::by(SortField::Name, Direction::Desc),
        }
    }
}
